//! Asynchronous snapshot intake.

use crate::sources::WallSource;
use arena_net::{ReconcileOutcome, SharedPredictionEngine};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Counters returned when the pump stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Payloads received.
    pub received: u64,
    /// Payloads that reconciled state.
    pub applied: u64,
    /// Payloads ignored as malformed or stale.
    pub ignored: u64,
}

/// Reconcile every payload arriving on `rx` until the channel closes.
///
/// Each payload is handled under the engine lock with the wall snapshot that is
/// current when it arrives.
pub fn spawn_snapshot_pump(
    engine: SharedPredictionEngine,
    walls: Arc<dyn WallSource>,
    mut rx: mpsc::Receiver<String>,
) -> JoinHandle<PumpStats> {
    tokio::spawn(async move {
        let mut stats = PumpStats::default();
        while let Some(payload) = rx.recv().await {
            stats.received += 1;
            let snapshot_walls = walls.current();
            match engine.reconcile_str(&payload, &snapshot_walls) {
                ReconcileOutcome::Ignored { reason } => {
                    debug!(?reason, "pump ignored snapshot");
                    stats.ignored += 1;
                }
                _ => stats.applied += 1,
            }
        }
        info!(
            received = stats.received,
            applied = stats.applied,
            ignored = stats.ignored,
            "Snapshot pump stopped"
        );
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::WallSnapshotCell;
    use arena_core::{InputState, Vec2};
    use arena_net::{PredictionConfig, PredictionEngine};
    use arena_physics::WallCollisionModel;

    #[tokio::test]
    async fn test_pump_reconciles_until_closed() {
        let engine = SharedPredictionEngine::new(PredictionEngine::new(
            PredictionConfig::default(),
            Vec2::new(100.0, 100.0),
        ));
        let walls = WallCollisionModel::empty();
        for seq in 1..=4 {
            engine.apply_input(InputState::from_axes(1.0, 0.0, false), seq, 0, &walls);
        }

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_snapshot_pump(
            engine.clone(),
            Arc::new(WallSnapshotCell::default()),
            rx,
        );

        tx.send(r#"{"x": 101, "y": 100, "lastProcessedInput": 2}"#.to_string())
            .await
            .unwrap();
        tx.send("garbage".to_string()).await.unwrap();
        tx.send(r#"{"x": 120, "y": 100, "lastProcessedInput": 4}"#.to_string())
            .await
            .unwrap();
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(
            stats,
            PumpStats {
                received: 3,
                applied: 2,
                ignored: 1
            }
        );
        let debug = engine.debug();
        assert_eq!(debug.predicted_position, Vec2::new(120.0, 100.0));
        assert_eq!(debug.buffer_size, 0);
    }
}
