//! A generation session: context store plus message log.

use crewline_state::{SessionId, SessionRecord};
use serde::{Deserialize, Serialize};

use crate::context::ProjectContext;
use crate::domain::message::{Message, MessageLog, UsageTotals};
use crate::role_orchestration::error::OrchestrationResult;

/// State threaded through every orchestrator call.
///
/// The routing cursor is never stored; it is read from the latest message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub context: ProjectContext,
    pub log: MessageLog,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Committed steps, user inputs included.
    pub fn steps(&self) -> u64 {
        self.log.len() as u64
    }

    pub fn usage_totals(&self) -> UsageTotals {
        self.log.usage_totals()
    }

    pub fn to_record(&self) -> OrchestrationResult<SessionRecord> {
        let context = serde_json::to_value(&self.context)?;
        let messages = self
            .log
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SessionRecord::new(self.id.clone(), self.steps(), context, messages)?)
    }

    pub fn from_record(record: SessionRecord) -> OrchestrationResult<Self> {
        let context: ProjectContext = serde_json::from_value(record.context)?;
        let messages = record
            .messages
            .into_iter()
            .map(serde_json::from_value::<Message>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: record.session_id,
            context,
            log: MessageLog::from_messages(messages),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, Role};
    use std::collections::BTreeMap;

    #[test]
    fn test_record_round_trip() {
        let mut session = Session::with_id(SessionId::from("demo"));
        session.context = session
            .context
            .update(Role::EndUser, "build it", &BTreeMap::new())
            .set_identity("demo", "a demo");
        session
            .log
            .append(Message::new(Role::EndUser, "build it").with_phase(Phase::Init));

        let record = session.to_record().unwrap();
        assert_eq!(record.steps, 1);
        record.verify().unwrap();

        let restored = Session::from_record(record).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_from_record_rejects_bad_context() {
        let record = SessionRecord::new(
            SessionId::from("bad"),
            0,
            serde_json::json!({"artifacts": [
                {"role": "analyst", "text": "", "files": {}},
                {"role": "analyst", "text": "", "files": {}}
            ]}),
            vec![],
        )
        .unwrap();
        assert!(Session::from_record(record).is_err());
    }
}
