//! Negotiation session store.
//!
//! Sessions serialize their mutating operations through conditional
//! updates: every write states the round count it was computed against and
//! fails with [`StoreError::RoundConflict`] when the stored session has
//! moved on. That keeps round numbers strictly increasing without any
//! lower-level locking across callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pactum_core::{NegotiationRound, NegotiationSession};
use tokio::sync::Mutex;
use tracing::info;

use crate::StoreError;

/// Persistence interface for negotiation sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: NegotiationSession) -> Result<(), StoreError>;

    async fn get(&self, session_id: &str) -> Result<NegotiationSession, StoreError>;

    /// Replace the stored session, provided its round count still equals
    /// `expected_rounds`.
    async fn update(
        &self,
        session: NegotiationSession,
        expected_rounds: usize,
    ) -> Result<(), StoreError>;

    /// Append the next round. Fails unless `round.round_number` continues
    /// the sequence and the previous round is no longer open.
    async fn append_round(
        &self,
        session_id: &str,
        round: NegotiationRound,
    ) -> Result<(), StoreError>;

    /// The at-most-one active session for a contract.
    async fn active_for_contract(
        &self,
        contract_id: &str,
    ) -> Result<Option<NegotiationSession>, StoreError>;
}

/// In-memory [`SessionStore`].
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, NegotiationSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NegotiationSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Validation(format!(
                "session already exists: {}",
                session.id
            )));
        }
        info!(session_id = %session.id, contract_id = %session.contract_id, "session created");
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<NegotiationSession, StoreError> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    async fn update(
        &self,
        mut session: NegotiationSession,
        expected_rounds: usize,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        let stored = sessions
            .get(&session.id)
            .ok_or_else(|| StoreError::SessionNotFound(session.id.clone()))?;
        if stored.rounds.len() != expected_rounds {
            return Err(StoreError::RoundConflict {
                session_id: session.id.clone(),
                reason: format!(
                    "expected {expected_rounds} rounds, store has {}",
                    stored.rounds.len()
                ),
            });
        }
        session.updated_at = Utc::now();
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn append_round(
        &self,
        session_id: &str,
        round: NegotiationRound,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        let next_number = session.rounds.len() as u32 + 1;
        if round.round_number != next_number {
            return Err(StoreError::RoundConflict {
                session_id: session_id.to_string(),
                reason: format!(
                    "round {} does not continue the sequence (next is {next_number})",
                    round.round_number
                ),
            });
        }
        if let Some(last) = session.rounds.last()
            && last.is_open()
        {
            return Err(StoreError::RoundConflict {
                session_id: session_id.to_string(),
                reason: format!("round {} is still awaiting a response", last.round_number),
            });
        }

        info!(session_id, round = round.round_number, "round appended");
        session.rounds.push(round);
        session.refresh_counters();
        Ok(())
    }

    async fn active_for_contract(
        &self,
        contract_id: &str,
    ) -> Result<Option<NegotiationSession>, StoreError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .values()
            .find(|s| s.contract_id == contract_id && s.status.is_active())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pactum_core::{RoundPlan, SessionStatus, Strategy};
    use std::collections::BTreeMap;

    fn strategy() -> Strategy {
        Strategy {
            overall_approach: "lead with liability".into(),
            priorities: vec![],
            walk_away_conditions: vec![],
            compromise_positions: BTreeMap::new(),
            rounds: vec![RoundPlan::default(); 3],
            estimated_timeline: String::new(),
            success_probability: 50,
            created_at: Utc::now(),
        }
    }

    fn session(contract_id: &str) -> NegotiationSession {
        NegotiationSession::new(contract_id, "u1", strategy())
    }

    fn closed_round(n: u32) -> NegotiationRound {
        let mut round = NegotiationRound::new(n, vec![]);
        round.completed_at = Some(Utc::now());
        round
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = MemorySessionStore::new();
        let s = session("c1");
        let id = s.id.clone();
        store.create(s).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().contract_id, "c1");
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let store = MemorySessionStore::new();
        let s = session("c1");
        store.create(s.clone()).await.unwrap();
        assert!(matches!(
            store.create(s).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn rounds_must_increase_by_one() {
        let store = MemorySessionStore::new();
        let s = session("c1");
        let id = s.id.clone();
        store.create(s).await.unwrap();

        store.append_round(&id, closed_round(1)).await.unwrap();

        // Skipping round 2 is a conflict.
        let result = store.append_round(&id, closed_round(3)).await;
        assert!(matches!(result, Err(StoreError::RoundConflict { .. })));

        store.append_round(&id, closed_round(2)).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().rounds.len(), 2);
    }

    #[tokio::test]
    async fn open_round_blocks_next_round() {
        let store = MemorySessionStore::new();
        let s = session("c1");
        let id = s.id.clone();
        store.create(s).await.unwrap();

        // Round 1 is appended open (awaiting response).
        store
            .append_round(&id, NegotiationRound::new(1, vec![]))
            .await
            .unwrap();

        let result = store.append_round(&id, closed_round(2)).await;
        assert!(matches!(result, Err(StoreError::RoundConflict { .. })));
    }

    #[tokio::test]
    async fn conditional_update_detects_stale_writer() {
        let store = MemorySessionStore::new();
        let s = session("c1");
        let id = s.id.clone();
        store.create(s).await.unwrap();

        let snapshot = store.get(&id).await.unwrap();
        store.append_round(&id, closed_round(1)).await.unwrap();

        // The snapshot was taken before the round landed.
        let result = store.update(snapshot, 0).await;
        assert!(matches!(result, Err(StoreError::RoundConflict { .. })));

        let fresh = store.get(&id).await.unwrap();
        store.update(fresh, 1).await.unwrap();
    }

    #[tokio::test]
    async fn active_for_contract_ignores_finished_sessions() {
        let store = MemorySessionStore::new();

        let mut done = session("c1");
        done.status = SessionStatus::Accepted;
        store.create(done).await.unwrap();
        assert!(
            store
                .active_for_contract("c1")
                .await
                .unwrap()
                .is_none()
        );

        let mut live = session("c1");
        live.status = SessionStatus::AwaitingResponse;
        let live_id = live.id.clone();
        store.create(live).await.unwrap();
        let found = store.active_for_contract("c1").await.unwrap().unwrap();
        assert_eq!(found.id, live_id);
    }
}
