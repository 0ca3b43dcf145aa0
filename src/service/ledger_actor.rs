use crate::db::models::{DbTransaction, NewTransaction, UserId};
use crate::db::sqlite::BridgeStorage;
use crate::error::BridgeError;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{debug, info, warn};

/// Messages handled by the ledger actor.
#[derive(Debug)]
pub enum LedgerMessage {
    /// Current reserve balance.
    GetBalance(RpcReplyPort<f64>),
    /// Store a user's statement rows and add their net change to the
    /// reserve in one SQL transaction; replies with rows and new balance.
    Import(
        UserId,
        Vec<NewTransaction>,
        f64,
        RpcReplyPort<Result<(Vec<DbTransaction>, f64), String>>,
    ),
}

/// Handle for interacting with the ledger actor.
#[derive(Clone)]
pub struct LedgerHandle {
    actor: ActorRef<LedgerMessage>,
}

impl LedgerHandle {
    pub async fn balance(&self) -> Result<f64, BridgeError> {
        ractor::call!(self.actor, LedgerMessage::GetBalance)
            .map_err(|e| BridgeError::RactorError(format!("GetBalance RPC failed: {e}")))
    }

    /// Import statement rows whose amounts sum to `delta`. Imports are
    /// serialized by the actor; the in-memory balance moves only after commit.
    pub async fn import(
        &self,
        user_id: UserId,
        rows: Vec<NewTransaction>,
        delta: f64,
    ) -> Result<(Vec<DbTransaction>, f64), BridgeError> {
        ractor::call!(self.actor, LedgerMessage::Import, user_id, rows, delta)
            .map_err(|e| BridgeError::RactorError(format!("Import RPC failed: {e}")))?
            .map_err(BridgeError::RactorError)
    }
}

struct LedgerState {
    storage: BridgeStorage,
    balance: f64,
}

/// Sole owner of the platform reserve balance.
struct LedgerActor;

#[ractor::async_trait]
impl Actor for LedgerActor {
    type Msg = LedgerMessage;
    type State = LedgerState;
    type Arguments = (BridgeStorage, f64);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        arguments: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (storage, initial) = arguments;
        let balance = storage
            .load_or_seed_reserve(initial)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Ledger load failed: {}", e)))?;
        info!(balance, "LedgerActor started");
        Ok(LedgerState { storage, balance })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            LedgerMessage::GetBalance(rp) => {
                let _ = rp.send(state.balance);
            }
            LedgerMessage::Import(user_id, rows, delta, rp) => {
                let next = state.balance + delta;
                match state.storage.import_statement(user_id, rows, next).await {
                    Ok(stored) => {
                        debug!(user_id, delta, balance = next, "reserve updated");
                        state.balance = next;
                        let _ = rp.send(Ok((stored, next)));
                    }
                    Err(e) => {
                        warn!(user_id, delta, "statement import rolled back: {}", e);
                        let _ = rp.send(Err(e.to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Spawn the ledger actor over `storage`, seeding the reserve with `initial`
/// when the ledger row does not exist yet.
pub async fn spawn(storage: BridgeStorage, initial: f64) -> Result<LedgerHandle, BridgeError> {
    let (actor, _jh) = Actor::spawn(None, LedgerActor, (storage, initial))
        .await
        .map_err(|e| BridgeError::RactorError(format!("failed to spawn LedgerActor: {e}")))?;
    Ok(LedgerHandle { actor })
}
