use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::state::AppState;

pub mod maintenance;

pub async fn start_scheduler(state: AppState) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let schedule = state.config.maintenance_schedule.clone();
    let maintenance_job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            if let Err(e) = maintenance::run_maintenance(state).await {
                tracing::error!("Maintenance run failed: {:#}", e);
            }
        })
    })?;
    scheduler.add(maintenance_job).await?;
    tracing::info!("Maintenance scheduled with cron expression {}", schedule);

    scheduler.start().await?;

    Ok(scheduler)
}
