//! Periodic anti-forgery keep-alive with an owned start/stop lifecycle.

// crates.io
use tokio::{
	task::JoinHandle,
	time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info};
// self
use crate::{_prelude::*, client::SessionClient, http::SessionHttpClient};

/// Owned handle for the background refresh task.
///
/// The task re-establishes the anti-forgery token at the descriptor's
/// interval. A tick whose predecessor is still outstanding is skipped
/// outright—no queuing, no cancellation of the outstanding call. The
/// scheduler's in-flight tracking is entirely its own; it never touches the
/// request-triggered refresh gate, and its failures are logged rather than
/// redirected.
#[derive(Debug)]
pub struct RefreshScheduler {
	task: JoinHandle<()>,
}
impl RefreshScheduler {
	/// Spawns the keep-alive task on the current tokio runtime.
	///
	/// The first refresh lands one full interval after spawn.
	pub fn spawn<C>(client: SessionClient<C>) -> Self
	where
		C: ?Sized + SessionHttpClient,
	{
		let period = client.descriptor.refresh_interval;
		let gate = Arc::new(AsyncMutex::new(()));
		let task = tokio::spawn(async move {
			let mut ticker = time::interval(period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			// A tokio interval fires immediately; consume that tick so the
			// schedule starts one period out.
			ticker.tick().await;

			loop {
				ticker.tick().await;

				let Some(in_flight) = gate.try_lock_arc() else {
					debug!("previous scheduled refresh still outstanding; skipping tick");

					continue;
				};
				let client = client.clone();

				tokio::spawn(async move {
					let _in_flight = in_flight;

					match client.scheduled_refresh().await {
						Ok(payload) if payload.success => info!("anti-forgery token refreshed"),
						Ok(payload) => error!(
							message = payload.message.as_deref().unwrap_or_default(),
							"scheduled refresh was rejected"
						),
						Err(err) => error!(error = %err, "scheduled refresh failed"),
					}
				});
			}
		});

		Self { task }
	}

	/// True while the scheduler task is alive.
	pub fn is_running(&self) -> bool {
		!self.task.is_finished()
	}

	/// Stops the ticker. A refresh call already issued runs to completion on
	/// its own task; it is never cancelled.
	pub fn stop(self) {
		self.task.abort();
	}
}
impl Drop for RefreshScheduler {
	fn drop(&mut self) {
		self.task.abort();
	}
}
