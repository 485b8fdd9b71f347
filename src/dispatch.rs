//! Dispatching agents against a queue.
//!
//! One tokio task per agent drains the queue; a dispatch returns only once
//! every worker has finished.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::agent::{Agent, ServiceObserver};
use crate::config::Settings;
use crate::core::{select, Message, PriorityQueue, Scorer, SelectionPolicy};
use crate::error::Result;

/// Messages serviced per agent during one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub serviced: Vec<(String, usize)>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.serviced.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dispatch Report:")?;
        for (agent, count) in &self.serviced {
            writeln!(f, "  {:<14} {}", agent, count)?;
        }
        write!(f, "  {:<14} {}", "Total", self.total())
    }
}

/// Fixed pool of agents started together against one queue.
pub struct Dispatcher {
    agents: Vec<Arc<Agent>>,
    observer: Arc<dyn ServiceObserver>,
    time_unit: Duration,
}

impl Dispatcher {
    pub fn new(
        agents: Vec<Arc<Agent>>,
        observer: Arc<dyn ServiceObserver>,
        time_unit: Duration,
    ) -> Self {
        Self {
            agents,
            observer,
            time_unit,
        }
    }

    /// Build the agent pool described by the settings.
    pub fn from_settings(settings: &Settings, observer: Arc<dyn ServiceObserver>) -> Result<Self> {
        let agents = settings
            .agents
            .iter()
            .map(|config| Agent::from_level_name(config.id.as_str(), &config.skill).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            agents,
            observer,
            Duration::from_millis(settings.simulation.time_unit_ms),
        ))
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Run every agent against `queue` and wait until all of them finish.
    pub async fn dispatch(&self, queue: Arc<PriorityQueue>) -> DispatchReport {
        tracing::info!(
            "Dispatching {} agent(s) against {} message(s)",
            self.agents.len(),
            queue.len()
        );

        let mut workers = JoinSet::new();
        for (index, agent) in self.agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let queue = Arc::clone(&queue);
            let observer = Arc::clone(&self.observer);
            let time_unit = self.time_unit;
            tracing::debug!(agent = %agent.id(), skill = %agent.skill(), "Starting worker");
            workers.spawn(async move {
                let serviced = agent.run(&queue, observer.as_ref(), time_unit).await;
                (index, serviced)
            });
        }

        let mut serviced: Vec<(String, usize)> = self
            .agents
            .iter()
            .map(|agent| (agent.id().to_string(), 0))
            .collect();
        while let Some(result) = workers.join_next().await {
            match result {
                Ok((index, count)) => serviced[index].1 = count,
                Err(e) => tracing::error!("Agent worker failed: {}", e),
            }
        }

        let report = DispatchReport { serviced };
        tracing::info!("Dispatch finished, {} message(s) serviced", report.total());
        report
    }
}

/// Score `text` and insert it into the queue.
pub fn enqueue(queue: &PriorityQueue, scorer: &Scorer, text: impl Into<String>) -> Message {
    let message = scorer.message(text);
    queue.insert(message.clone());
    message
}

/// Dispatch every agent against the full queue.
pub async fn dispatch_all(queue: Arc<PriorityQueue>, dispatcher: &Dispatcher) -> DispatchReport {
    dispatcher.dispatch(queue).await
}

/// Carve a group out of `queue` and dispatch agents against that group only.
///
/// Fails with `EmptyQueue` before any agent starts if `queue` is empty.
pub async fn dispatch_selection(
    queue: &PriorityQueue,
    dispatcher: &Dispatcher,
    policy: SelectionPolicy,
) -> Result<DispatchReport> {
    let group = select(queue, policy)?;
    tracing::info!(
        "Selected {} message(s) with policy {}, {} left in queue",
        group.len(),
        policy,
        queue.len()
    );
    Ok(dispatcher.dispatch(Arc::new(group)).await)
}
