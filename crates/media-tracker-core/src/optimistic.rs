//! Apply-then-confirm helper shared by every mutation flow.
//!
//! `apply` changes local state right away and returns whatever `rollback`
//! needs to undo it. `issue` performs the network call. On success the
//! response is handed to `reconcile`; on failure `rollback` receives the undo
//! token and the error is returned untouched.
//!
//! No lock may be held across the call: `apply`, `reconcile` and `rollback`
//! take their own short-lived locks.

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

pub async fn run<U, T, R, E, Issue, IssueFut, Reconcile, ReconcileFut>(
    operation: &str,
    apply: impl FnOnce() -> U,
    issue: Issue,
    reconcile: Reconcile,
    rollback: impl FnOnce(U),
) -> Result<R, E>
where
    Issue: FnOnce() -> IssueFut,
    IssueFut: Future<Output = Result<T, E>>,
    Reconcile: FnOnce(T) -> ReconcileFut,
    ReconcileFut: Future<Output = R>,
    E: Display,
{
    let undo = apply();
    debug!(operation, "Local change applied, issuing request");

    match issue().await {
        Ok(response) => {
            debug!(operation, "Request succeeded, reconciling");
            Ok(reconcile(response).await)
        }
        Err(e) => {
            warn!(operation, error = %e, "Request failed, rolling back");
            rollback(undo);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_success_keeps_change_and_reconciles() {
        let state = Arc::new(Mutex::new(vec!["a"]));
        let result: Result<usize, String> = run(
            "push",
            || state.lock().unwrap().push("b"),
            || async { Ok(7) },
            |n| {
                let state = Arc::clone(&state);
                async move {
                    state.lock().unwrap().push("confirmed");
                    n * 2
                }
            },
            |_| panic!("rollback on success"),
        )
        .await;

        assert_eq!(result, Ok(14));
        assert_eq!(*state.lock().unwrap(), vec!["a", "b", "confirmed"]);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_with_undo_token() {
        let state = Arc::new(Mutex::new(vec!["a"]));
        let result: Result<(), String> = run(
            "push",
            || {
                let mut guard = state.lock().unwrap();
                guard.push("b");
                guard.len() - 1
            },
            || async { Err("offline".to_string()) },
            |_: ()| async {},
            |index| {
                state.lock().unwrap().remove(index);
            },
        )
        .await;

        assert_eq!(result, Err("offline".to_string()));
        assert_eq!(*state.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_optimistic_state_visible_while_in_flight() {
        let state = Arc::new(Mutex::new(0));
        let observed = Arc::new(Mutex::new(None));
        let _: Result<(), String> = run(
            "bump",
            || *state.lock().unwrap() += 1,
            || {
                let state = Arc::clone(&state);
                let observed = Arc::clone(&observed);
                async move {
                    *observed.lock().unwrap() = Some(*state.lock().unwrap());
                    Ok(())
                }
            },
            |_| async {},
            |_| {},
        )
        .await;

        assert_eq!(*observed.lock().unwrap(), Some(1));
    }
}
