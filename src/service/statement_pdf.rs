use crate::db::models::DbTransaction;
use crate::error::BridgeError;
use printpdf::{BuiltinFont, Mm, PdfDocument};

// US letter, one inch margins.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 25.4;
const ROW_HEIGHT: f32 = 7.0;

const DATE_COL: f32 = MARGIN;
const DESCRIPTION_COL: f32 = 52.9;
const AMOUNT_COL: f32 = 141.1;

const SIGNATURE_LINE: &str = "Digitally signed by Advanced Signature Service";

fn pdf_err(e: impl std::fmt::Display) -> BridgeError {
    BridgeError::PdfRender(e.to_string())
}

/// Account holder details printed in the statement header.
pub struct StatementHeader<'a> {
    pub holder: &'a str,
    pub account_number: &'a str,
}

/// Render a bank statement: header, a date/description/amount table that
/// flows onto new pages, and a signature footer on the last page.
pub fn render_statement_pdf(
    header: &StatementHeader<'_>,
    rows: &[DbTransaction],
) -> Result<Vec<u8>, BridgeError> {
    let title = format!("Bank Statement for {}", header.holder);
    let (doc, page, layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let oblique = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(pdf_err)?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    current.use_text(title.as_str(), 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= 6.4;
    current.use_text(
        format!("Account: {}", header.account_number),
        12.0,
        Mm(MARGIN),
        Mm(y),
        &regular,
    );
    y -= 10.6;
    current.use_text("Date", 12.0, Mm(DATE_COL), Mm(y), &bold);
    current.use_text("Description", 12.0, Mm(DESCRIPTION_COL), Mm(y), &bold);
    current.use_text("Amount", 12.0, Mm(AMOUNT_COL), Mm(y), &bold);
    y -= ROW_HEIGHT;

    for row in rows {
        if y < MARGIN {
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - MARGIN;
        }
        current.use_text(
            row.date.format("%Y-%m-%d").to_string(),
            12.0,
            Mm(DATE_COL),
            Mm(y),
            &regular,
        );
        current.use_text(
            row.description.as_str(),
            12.0,
            Mm(DESCRIPTION_COL),
            Mm(y),
            &regular,
        );
        current.use_text(
            format!("{:.2}", row.amount),
            12.0,
            Mm(AMOUNT_COL),
            Mm(y),
            &regular,
        );
        y -= ROW_HEIGHT;
    }

    current.use_text(SIGNATURE_LINE, 10.0, Mm(MARGIN), Mm(17.6), &oblique);

    doc.save_to_bytes().map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TransactionKind;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn renders_multi_page_statement() {
        let rows: Vec<DbTransaction> = (0..80)
            .map(|i| DbTransaction {
                id: i,
                user_id: 1,
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: format!("Line {i}"),
                amount: 10.0,
                transaction_type: TransactionKind::Deposit,
                ai_verified: true,
                created_at: Utc::now(),
            })
            .collect();
        let header = StatementHeader {
            holder: "dana",
            account_number: "N/A",
        };
        let bytes = render_statement_pdf(&header, &rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
