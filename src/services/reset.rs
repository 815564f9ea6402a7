use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::bot::coordinator::Coordinator;
use crate::utils::datetime::format_countdown;
use crate::utils::logging::log_system_event;

/// Discards the weekly poll at kickoff.
///
/// Each run is a one-shot job that schedules its successor for the following
/// kickoff, so the delay is always measured from the coordinator's clock.
pub struct PollResetService {
    coordinator: Arc<Coordinator>,
    scheduler: JobScheduler,
}

impl PollResetService {
    pub async fn new(
        coordinator: Arc<Coordinator>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            coordinator,
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let until = self.coordinator.time_until_next_match();
        let job = reset_job(self.coordinator.clone())?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        log_system_event(
            "Poll reset service started",
            Some(&format!("next reset in {}", format_countdown(until))),
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        log_system_event("Poll reset service stopped", None);
        Ok(())
    }

    /// Runs a reset immediately, outside the schedule.
    pub async fn reset_now(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.coordinator.reset_cycle().await;
        Ok(())
    }
}

fn reset_job(coordinator: Arc<Coordinator>) -> Result<Job, JobSchedulerError> {
    let delay = coordinator
        .time_until_next_match()
        .to_std()
        .unwrap_or_default();

    Job::new_one_shot_async(delay, move |_uuid, scheduler| {
        let coordinator = coordinator.clone();
        Box::pin(async move {
            coordinator.reset_cycle().await;

            let next = match reset_job(coordinator) {
                Ok(job) => scheduler.add(job).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = next {
                tracing::error!("Failed to schedule the next poll reset: {}", e);
            }
        })
    })
}
