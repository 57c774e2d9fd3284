//! Message router: one inbound WhatsApp message in, one reply and one log row out.

use crate::coach::persona::{self, COACH_PROMPT};
use crate::inbound::{InboundMessage, MessageKind};
use crate::llm::TextGenerator;
use crate::sheets::{AppendLog, LogRecord, LogRow};
use std::sync::Arc;

/// How many of the most recent log records the status summary looks at.
const STATUS_WINDOW: usize = 10;

/// Keyword intents, checked in `KEYWORD_RULES` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextIntent {
    Skip,
    Commit,
    Status,
}

fn mentions_skip(text: &str) -> bool {
    text.contains("skip") || text.contains("miss")
}

fn mentions_commit(text: &str) -> bool {
    text.contains("commit")
}

fn mentions_status(text: &str) -> bool {
    text.contains("status")
}

/// First match wins.
const KEYWORD_RULES: &[(fn(&str) -> bool, TextIntent)] = &[
    (mentions_skip, TextIntent::Skip),
    (mentions_commit, TextIntent::Commit),
    (mentions_status, TextIntent::Status),
];

/// Classify a message body by keyword (case-insensitive). None = free text for the model.
pub fn classify(body: &str) -> Option<TextIntent> {
    let text = body.trim().to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(matches, _)| matches(&text))
        .map(|(_, intent)| *intent)
}

/// Whether a record's `type` column counts as a workout proof.
fn is_workout_record(record: &LogRecord) -> bool {
    let kind = record.get("type").unwrap_or("").to_lowercase();
    kind.starts_with("work") || kind.contains("workout")
}

/// Output budgets for the two completion paths.
#[derive(Debug, Clone, Copy)]
pub struct ReplyBudget {
    pub media_max_tokens: u32,
    pub text_max_tokens: u32,
}

impl Default for ReplyBudget {
    fn default() -> Self {
        Self {
            media_max_tokens: 300,
            text_max_tokens: 200,
        }
    }
}

/// Reply text plus the row recording it.
#[derive(Debug, Clone)]
pub struct RoutedReply {
    pub reply: String,
    pub row: LogRow,
}

pub struct MessageRouter {
    llm: Arc<dyn TextGenerator>,
    log: Arc<dyn AppendLog>,
    budget: ReplyBudget,
}

impl MessageRouter {
    pub fn new(llm: Arc<dyn TextGenerator>, log: Arc<dyn AppendLog>, budget: ReplyBudget) -> Self {
        Self { llm, log, budget }
    }

    /// Route the message, append its row, return the reply. A failed append is logged and
    /// does not cost the user their reply.
    pub async fn handle(&self, msg: &InboundMessage) -> RoutedReply {
        let routed = self.route(msg).await;
        if let Err(e) = self.log.append(&routed.row).await {
            log::warn!("coach: failed to log interaction from {}: {}", msg.sender, e);
        }
        routed
    }

    /// Decide the reply and build the row, without writing it.
    pub async fn route(&self, msg: &InboundMessage) -> RoutedReply {
        if msg.has_media() {
            let url = msg.first_media().map(|m| m.url.clone()).unwrap_or_default();
            let reply = self.analyze_media(&url).await;
            RoutedReply {
                row: LogRow::now(&msg.sender, MessageKind::Media, url, &reply),
                reply,
            }
        } else {
            let reply = self.reply_to_text(&msg.body).await;
            RoutedReply {
                row: LogRow::now(&msg.sender, MessageKind::Text, &msg.body, &reply),
                reply,
            }
        }
    }

    async fn analyze_media(&self, url: &str) -> String {
        if url.is_empty() {
            return persona::media_fallback_reply("no media url in request");
        }
        let prompt = persona::media_analysis_prompt(url);
        match self
            .llm
            .complete(COACH_PROMPT, &prompt, self.budget.media_max_tokens)
            .await
        {
            Ok(analysis) => analysis.trim().to_string(),
            Err(e) => {
                log::warn!("coach: image analysis failed: {}", e);
                persona::media_fallback_reply(&e.to_string())
            }
        }
    }

    async fn reply_to_text(&self, body: &str) -> String {
        match classify(body) {
            Some(TextIntent::Skip) => persona::SKIP_REPLY.to_string(),
            Some(TextIntent::Commit) => persona::COMMIT_REPLY.to_string(),
            Some(TextIntent::Status) => self.status_summary().await,
            None => match self
                .llm
                .complete(COACH_PROMPT, body, self.budget.text_max_tokens)
                .await
            {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    log::warn!("coach: text reply failed: {}", e);
                    persona::TEXT_FALLBACK_REPLY.to_string()
                }
            },
        }
    }

    /// Workout-typed rows among the last `STATUS_WINDOW` records. Only rows whose `type`
    /// column says work/workout count; the bot itself logs `text`/`media`.
    async fn status_summary(&self) -> String {
        let records = match self.log.records().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("coach: reading log for status failed: {}", e);
                Vec::new()
            }
        };
        let recent = &records[records.len().saturating_sub(STATUS_WINDOW)..];
        let workouts = recent.iter().filter(|r| is_workout_record(r)).count();
        persona::status_reply(workouts, recent.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::MediaRef;
    use crate::llm::LlmError;
    use crate::sheets::{records_from_values, MemoryLog, SheetError, LOG_HEADER};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt; answers with `reply` or fails.
    struct ScriptedModel {
        reply: Option<String>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedModel {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedModel {
        async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, LlmError> {
            assert_eq!(system, COACH_PROMPT);
            self.calls.lock().unwrap().push((user.to_string(), max_tokens));
            self.reply
                .clone()
                .ok_or_else(|| LlmError::Api("503 upstream down".to_string()))
        }
    }

    /// Log whose records are fixed and whose appends always fail.
    struct BrokenLog {
        records: Vec<Vec<String>>,
    }

    #[async_trait]
    impl AppendLog for BrokenLog {
        async fn append(&self, _row: &LogRow) -> Result<(), SheetError> {
            Err(SheetError::Api("quota exceeded".to_string()))
        }

        async fn records(&self) -> Result<Vec<LogRecord>, SheetError> {
            Ok(records_from_values(self.records.clone()))
        }
    }

    fn router(model: Arc<ScriptedModel>, log: Arc<dyn AppendLog>) -> MessageRouter {
        MessageRouter::new(model, log, ReplyBudget::default())
    }

    fn media_message(url: &str) -> InboundMessage {
        InboundMessage {
            sender: "whatsapp:+911234".to_string(),
            body: String::new(),
            num_media: 1,
            media: vec![MediaRef {
                url: url.to_string(),
                content_type: Some("image/jpeg".to_string()),
            }],
        }
    }

    #[test]
    fn classify_is_case_insensitive_and_ordered() {
        assert_eq!(classify("I want to SKIP today"), Some(TextIntent::Skip));
        assert_eq!(classify("Missed leg day"), Some(TextIntent::Skip));
        assert_eq!(classify("skip... ok I commit"), Some(TextIntent::Skip));
        assert_eq!(classify("  COMMIT  "), Some(TextIntent::Commit));
        assert_eq!(classify("commit, then status"), Some(TextIntent::Commit));
        assert_eq!(classify("Status?"), Some(TextIntent::Status));
        assert_eq!(classify("ran 5k this morning"), None);
        assert_eq!(classify(""), None);
    }

    #[tokio::test]
    async fn skip_reply_is_fixed_and_logged_as_text() {
        let model = ScriptedModel::answering("unused");
        let log = Arc::new(MemoryLog::new());
        let out = router(model.clone(), log.clone())
            .handle(&InboundMessage::text("whatsapp:+911234", "I want to skip today"))
            .await;
        assert!(out.reply.contains("Not acceptable"));
        assert!(model.calls().is_empty());
        let rows = log.rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sender, "whatsapp:+911234");
        assert_eq!(rows[0].kind, MessageKind::Text);
        assert_eq!(rows[0].content, "I want to skip today");
        assert_eq!(rows[0].reply, out.reply);
    }

    #[tokio::test]
    async fn commit_reply() {
        let log = Arc::new(MemoryLog::new());
        let out = router(ScriptedModel::answering("unused"), log)
            .handle(&InboundMessage::text("a", "I commit"))
            .await;
        assert_eq!(out.reply, persona::COMMIT_REPLY);
    }

    #[tokio::test]
    async fn free_text_goes_to_model_with_text_budget_and_is_trimmed() {
        let model = ScriptedModel::answering("  Run again tomorrow.\n");
        let log = Arc::new(MemoryLog::new());
        let out = router(model.clone(), log)
            .handle(&InboundMessage::text("a", "  feeling lazy  "))
            .await;
        assert_eq!(out.reply, "Run again tomorrow.");
        assert_eq!(model.calls(), vec![("feeling lazy".to_string(), 200)]);
        assert_eq!(out.row.content, "feeling lazy");
    }

    #[tokio::test]
    async fn free_text_failure_uses_instructional_fallback() {
        let log = Arc::new(MemoryLog::new());
        let out = router(ScriptedModel::failing(), log.clone())
            .handle(&InboundMessage::text("a", "hello coach"))
            .await;
        assert_eq!(out.reply, persona::TEXT_FALLBACK_REPLY);
        assert_eq!(log.rows().await[0].reply, persona::TEXT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn media_is_analyzed_with_media_budget_and_logged_as_media() {
        let model = ScriptedModel::answering(" Solid squat depth. Now log dinner. ");
        let log = Arc::new(MemoryLog::new());
        let out = router(model.clone(), log.clone())
            .handle(&media_message("https://x/img.jpg"))
            .await;
        assert_eq!(out.reply, "Solid squat depth. Now log dinner.");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("https://x/img.jpg"));
        assert_eq!(calls[0].1, 300);
        let rows = log.rows().await;
        assert_eq!(rows[0].kind, MessageKind::Media);
        assert_eq!(rows[0].content, "https://x/img.jpg");
    }

    #[tokio::test]
    async fn media_wins_over_keywords_in_body() {
        let log = Arc::new(MemoryLog::new());
        let mut msg = media_message("https://x/img.jpg");
        msg.body = "skip".to_string();
        let out = router(ScriptedModel::answering("ok"), log.clone())
            .handle(&msg)
            .await;
        assert_eq!(out.reply, "ok");
        assert_eq!(log.rows().await[0].kind, MessageKind::Media);
    }

    #[tokio::test]
    async fn media_failure_reply_carries_reason() {
        let log = Arc::new(MemoryLog::new());
        let out = router(ScriptedModel::failing(), log)
            .handle(&media_message("https://x/img.jpg"))
            .await;
        assert!(out.reply.starts_with("Could not analyze image automatically."));
        assert!(out.reply.contains("503 upstream down"));
    }

    #[tokio::test]
    async fn media_without_url_falls_back_without_calling_model() {
        let model = ScriptedModel::answering("unused");
        let log = Arc::new(MemoryLog::new());
        let mut msg = media_message("");
        msg.media.clear();
        let out = router(model.clone(), log.clone()).handle(&msg).await;
        assert!(out.reply.starts_with(persona::MEDIA_FALLBACK_PREFIX));
        assert!(model.calls().is_empty());
        assert_eq!(log.rows().await[0].kind, MessageKind::Media);
    }

    #[tokio::test]
    async fn status_counts_workout_typed_rows_in_last_ten() {
        let header: Vec<String> = LOG_HEADER.iter().map(|s| s.to_string()).collect();
        let mut values = vec![header];
        // 12 rows: first two are workouts but fall outside the window
        for i in 0..12 {
            let kind = match i {
                0 | 1 => "workout",
                3 => "Workout",
                5 => "work-proof",
                7 => "media",
                _ => "text",
            };
            values.push(vec![
                format!("t{}", i),
                "a".to_string(),
                kind.to_string(),
                "c".to_string(),
                "r".to_string(),
            ]);
        }
        let log = Arc::new(BrokenLog { records: values });
        let out = router(ScriptedModel::answering("unused"), log)
            .handle(&InboundMessage::text("a", "status"))
            .await;
        assert_eq!(
            out.reply,
            "You logged 2 workout proofs in the last 10 entries. Be better."
        );
    }

    #[tokio::test]
    async fn status_over_own_rows_counts_zero() {
        let log = Arc::new(MemoryLog::new());
        let r = router(ScriptedModel::answering("x"), log.clone());
        r.handle(&InboundMessage::text("a", "commit")).await;
        r.handle(&media_message("https://x/1.jpg")).await;
        let out = r.handle(&InboundMessage::text("a", "status")).await;
        assert_eq!(out.reply, persona::status_reply(0, 2));
        assert_eq!(log.rows().await.len(), 3);
    }

    #[tokio::test]
    async fn failed_append_still_returns_reply() {
        let log = Arc::new(BrokenLog { records: Vec::new() });
        let out = router(ScriptedModel::answering("unused"), log)
            .handle(&InboundMessage::text("a", "miss"))
            .await;
        assert_eq!(out.reply, persona::SKIP_REPLY);
    }
}
