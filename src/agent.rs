//! Agents that drain a queue, servicing one message at a time.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::core::{Message, PriorityQueue};
use crate::error::Error;

/// Agent experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillLevel {
    Basic,
    Intermediate,
    Expert,
}

impl SkillLevel {
    /// Service time multiplier; lower is faster.
    pub fn multiplier(&self) -> f64 {
        match self {
            SkillLevel::Basic => 1.0,
            SkillLevel::Intermediate => 0.75,
            SkillLevel::Expert => 0.5,
        }
    }
}

impl FromStr for SkillLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "basico" | "básico" => Ok(SkillLevel::Basic),
            "intermediate" | "intermedio" => Ok(SkillLevel::Intermediate),
            "expert" | "experto" => Ok(SkillLevel::Expert),
            _ => Err(Error::InvalidSkillLevel(s.to_string())),
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Basic => write!(f, "basic"),
            SkillLevel::Intermediate => write!(f, "intermediate"),
            SkillLevel::Expert => write!(f, "expert"),
        }
    }
}

/// Receives per-message service notifications.
pub trait ServiceObserver: Send + Sync {
    /// Called after the agent took a message and before the service delay.
    fn on_started(&self, agent: &Agent, message: &Message);

    /// Called once the service delay has elapsed.
    fn on_finished(&self, agent: &Agent, message: &Message);
}

/// Observer that writes service events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ServiceObserver for TracingObserver {
    fn on_started(&self, agent: &Agent, message: &Message) {
        tracing::info!(agent = %agent.id(), priority = message.priority(), "Servicing message: {}", message);
    }

    fn on_finished(&self, agent: &Agent, message: &Message) {
        tracing::info!(agent = %agent.id(), priority = message.priority(), "Finished message: {}", message);
    }
}

/// A worker with a fixed skill level.
#[derive(Debug)]
pub struct Agent {
    id: String,
    skill: SkillLevel,
    busy: AtomicBool,
}

impl Agent {
    pub fn new(id: impl Into<String>, skill: SkillLevel) -> Self {
        Self {
            id: id.into(),
            skill,
            busy: AtomicBool::new(false),
        }
    }

    /// Create an agent from a skill level name such as `"experto"`.
    pub fn from_level_name(id: impl Into<String>, level: &str) -> Result<Self, Error> {
        Ok(Self::new(id, level.parse()?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn skill(&self) -> SkillLevel {
        self.skill
    }

    /// True only while a message is being serviced.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Service time in abstract units.
    ///
    /// `(words / 10 + priority / 2) * multiplier`
    pub fn service_time(&self, message: &Message) -> f64 {
        let words = message.word_count() as f64;
        let priority = f64::from(message.priority());
        (words / 10.0 + priority / 2.0) * self.skill.multiplier()
    }

    /// Service time converted to wall-clock time.
    pub fn service_duration(&self, message: &Message, time_unit: Duration) -> Duration {
        time_unit.mul_f64(self.service_time(message))
    }

    /// Drain `queue` until it is empty, returning how many messages this
    /// agent serviced.
    ///
    /// The queue lock is released before the service delay starts.
    pub async fn run(
        &self,
        queue: &PriorityQueue,
        observer: &dyn ServiceObserver,
        time_unit: Duration,
    ) -> usize {
        let mut serviced = 0;
        loop {
            let message = match queue.remove_highest() {
                Ok(message) => message,
                Err(Error::EmptyQueue) => break,
                Err(e) => {
                    tracing::error!(agent = %self.id, "Unexpected queue error: {}", e);
                    break;
                }
            };

            self.busy.store(true, Ordering::SeqCst);
            observer.on_started(self, &message);
            tokio::time::sleep(self.service_duration(&message, time_unit)).await;
            observer.on_finished(self, &message);
            self.busy.store(false, Ordering::SeqCst);
            serviced += 1;
        }

        tracing::debug!(agent = %self.id, serviced, "Queue drained");
        serviced
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent {} ({})", self.id, self.skill)
    }
}
