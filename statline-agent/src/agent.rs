//! Agent implementation - the completion <-> tool loop

use crate::tools;
use statline_error::{Error, Result};
use statline_llm::{
    ChatMessage, CompletionRequest, LlmProvider, UsageTracker,
};
use statline_table::Table;

/// Fixed analyst instruction, matching the demo's framing.
const ANALYST_INSTRUCTION: &str =
    "You are a sports data analyst. Use the provided table of NFL player \
     statistics for the 2025 season to answer the question as accurately as \
     possible. Query the table through the available tools; do not guess \
     numbers. If the data does not contain the information needed to answer \
     the question, respond with 'I don't know based on the provided data.'";

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Print each tool call and result to the console
    pub verbose: bool,
    /// Upper bound on completion rounds before giving up
    pub max_steps: usize,
    /// Sampling temperature (0 keeps the demo close to deterministic)
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            max_steps: 8,
            temperature: 0.0,
        }
    }
}

/// One executed tool call in the trace
#[derive(Debug, Clone)]
pub struct AgentStep {
    pub step: usize,
    pub tool: String,
    pub arguments: String,
    pub result: String,
}

/// Final answer plus the trace that produced it
#[derive(Debug, Clone)]
pub struct AgentAnswer {
    pub text: String,
    pub steps: Vec<AgentStep>,
}

/// The data-aware responder - owns the table, talks through any provider.
pub struct Agent<P: LlmProvider> {
    provider: P,
    table: Table,
    config: AgentConfig,
    tracker: UsageTracker,
}

impl<P: LlmProvider> Agent<P> {
    /// Create a new agent with default configuration
    pub fn new(provider: P, table: Table) -> Self {
        Self::with_config(provider, table, AgentConfig::default())
    }

    /// Create a new agent with custom configuration
    pub fn with_config(provider: P, table: Table, config: AgentConfig) -> Self {
        Self {
            provider,
            table,
            config,
            tracker: UsageTracker::new(),
        }
    }

    /// Token usage accumulated across all questions so far
    pub fn usage(&self) -> &UsageTracker {
        &self.tracker
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\n\nThe table has {} rows with columns: {}.",
            ANALYST_INSTRUCTION,
            self.table.len(),
            self.table.headers().join(", ")
        )
    }

    /// Answer one question, running tools until the model replies in text.
    pub async fn ask(&mut self, question: &str) -> Result<AgentAnswer> {
        if self.config.verbose {
            println!("Question: {}\n", question);
        }

        let mut messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(question),
        ];
        let mut steps: Vec<AgentStep> = Vec::new();

        for _ in 0..self.config.max_steps {
            let request = CompletionRequest::new(messages.clone())
                .with_temperature(self.config.temperature)
                .with_tools(tools::definitions());

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| Error::from(e).with_operation("agent::ask"))?;

            self.tracker.track(&response.model, &response.usage);

            if !response.tool_calls.is_empty() {
                messages.push(ChatMessage::assistant_tool_calls(response.tool_calls.clone()));

                for call in &response.tool_calls {
                    let result = tools::dispatch(&self.table, call)
                        .unwrap_or_else(|e| format!("tool error: {}", e));

                    if self.config.verbose {
                        println!("   tool: {}({})", call.name, call.arguments);
                        for line in result.lines() {
                            println!("      {}", line);
                        }
                    }

                    steps.push(AgentStep {
                        step: steps.len() + 1,
                        tool: call.name.clone(),
                        arguments: call.arguments.to_string(),
                        result: result.clone(),
                    });
                    messages.push(ChatMessage::tool_result(&call.name, result));
                }
                continue;
            }

            if let Some(text) = response.content {
                if self.config.verbose {
                    println!("\n   Answer after {} tool call(s)\n", steps.len());
                }
                return Ok(AgentAnswer { text, steps });
            }

            return Err(Error::inference_failed(
                "model returned neither content nor tool calls",
            )
            .with_operation("agent::ask"));
        }

        Err(Error::step_limit_exceeded(self.config.max_steps).with_operation("agent::ask"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statline_error::ErrorKind;
    use statline_llm::{
        CompletionResponse, FinishReason, ProviderError, StreamReceiver, ToolCall, Usage,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A provider that plays back a fixed script of responses.
    struct Scripted {
        responses: Mutex<VecDeque<CompletionResponse>>,
    }

    impl Scripted {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("script exhausted".into()))
        }

        async fn stream(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<StreamReceiver, ProviderError> {
            Err(ProviderError::Other("scripted provider does not stream".into()))
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            model: "scripted".into(),
            content: Some(text.into()),
            tool_calls: vec![],
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        }
    }

    fn tool_response(calls: Vec<ToolCall>) -> CompletionResponse {
        CompletionResponse {
            model: "scripted".into(),
            content: None,
            tool_calls: calls,
            finish_reason: FinishReason::ToolCalls,
            usage: Usage::default(),
        }
    }

    fn sample_table() -> Table {
        let csv = "\
PlayerName,Team,ReceivingTD
PlayerA,TeamX,5
PlayerB,TeamY,7
PlayerC,TeamX,3
";
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn quiet() -> AgentConfig {
        AgentConfig {
            verbose: false,
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let provider = Scripted::new(vec![
            tool_response(vec![ToolCall::new(
                "top_by_column",
                serde_json::json!({"column": "ReceivingTD"}),
            )]),
            text_response("PlayerB had the most receiving touchdowns with 7."),
        ]);

        let mut agent = Agent::with_config(provider, sample_table(), quiet());
        let answer = agent.ask("Which player had the most receiving touchdowns?").await.unwrap();

        assert_eq!(answer.text, "PlayerB had the most receiving touchdowns with 7.");
        assert_eq!(answer.steps.len(), 1);
        assert_eq!(answer.steps[0].tool, "top_by_column");
        assert!(answer.steps[0].result.contains("PlayerB"));
        assert_eq!(agent.usage().total_calls, 2);
    }

    #[tokio::test]
    async fn test_direct_answer_without_tools() {
        let provider = Scripted::new(vec![text_response("I don't know based on the provided data.")]);
        let mut agent = Agent::with_config(provider, sample_table(), quiet());

        let answer = agent.ask("Who won the Super Bowl?").await.unwrap();
        assert!(answer.steps.is_empty());
        assert!(answer.text.starts_with("I don't know"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recoverable() {
        let provider = Scripted::new(vec![
            tool_response(vec![ToolCall::new(
                "run_python",
                serde_json::json!({"code": "df.head()"}),
            )]),
            text_response("I don't know based on the provided data."),
        ]);

        let mut agent = Agent::with_config(provider, sample_table(), quiet());
        let answer = agent.ask("anything").await.unwrap();

        // the failed call was reported to the model as tool output, not raised
        assert_eq!(answer.steps.len(), 1);
        assert!(answer.steps[0].result.starts_with("tool error:"));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let looping: Vec<CompletionResponse> = (0..3)
            .map(|_| {
                tool_response(vec![ToolCall::new("list_columns", serde_json::json!({}))])
            })
            .collect();
        let provider = Scripted::new(looping);

        let config = AgentConfig {
            verbose: false,
            max_steps: 3,
            temperature: 0.0,
        };
        let mut agent = Agent::with_config(provider, sample_table(), config);

        let err = agent.ask("loop forever").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepLimitExceeded);
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let provider = Scripted::new(vec![CompletionResponse {
            model: "scripted".into(),
            content: None,
            tool_calls: vec![],
            finish_reason: FinishReason::Unknown,
            usage: Usage::default(),
        }]);

        let mut agent = Agent::with_config(provider, sample_table(), quiet());
        let err = agent.ask("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
    }

    #[test]
    fn test_system_prompt_includes_table_shape() {
        let provider = Scripted::new(vec![]);
        let agent = Agent::with_config(provider, sample_table(), quiet());
        let prompt = agent.system_prompt();

        assert!(prompt.contains("sports data analyst"));
        assert!(prompt.contains("I don't know based on the provided data."));
        assert!(prompt.contains("3 rows"));
        assert!(prompt.contains("PlayerName, Team, ReceivingTD"));
    }
}
