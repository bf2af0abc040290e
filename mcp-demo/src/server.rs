//! MCP server implementation: the demo tools, resource, and prompt.

use rmcp::{
    ServerHandler,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, Content, GetPromptRequestParams, GetPromptResult,
        Implementation, InitializeResult, ListPromptsResult, ListResourcesResult,
        PaginatedRequestParams, PromptMessage, PromptMessageRole, ProtocolVersion, RawResource,
        ReadResourceRequestParams, ReadResourceResult, ResourceContents, ServerCapabilities,
    },
    prompt, prompt_handler, prompt_router,
    schemars::JsonSchema,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use serde_json::json;

/// Type alias for ServerInfo (same as InitializeResult).
type ServerInfo = InitializeResult;

/// URI of the fixed server-status resource.
const STATUS_RESOURCE_URI: &str = "resource://status/server";

/// Canned content of the status resource.
const STATUS_TEXT: &str =
    "Server running normally with no known errors. 100 requests handled since last start.";

/// Demo MCP server exposing a fixed set of tools, one resource, and one prompt.
#[derive(Clone)]
pub struct DemoServer {
    /// Router for tool calls.
    tool_router: ToolRouter<Self>,
    /// Router for prompt requests.
    prompt_router: PromptRouter<Self>,
}

impl DemoServer {
    /// Create a new demo server instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }
}

impl Default for DemoServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for the echo tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoParams {
    /// Text message to echo back.
    pub message: String,
}

/// Arithmetic operator accepted by the calculation tool.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub enum Operator {
    /// Addition.
    #[serde(rename = "+")]
    Add,
    /// Subtraction.
    #[serde(rename = "-")]
    Sub,
    /// Multiplication.
    #[serde(rename = "*")]
    Mul,
    /// Division.
    #[serde(rename = "/")]
    Div,
}

/// Parameters for the calculation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CalculationParams {
    /// First operand.
    pub a: f64,
    /// Second operand.
    pub b: f64,
    /// Operation to perform (+, -, *, /).
    pub operator: Operator,
}

/// Arguments for the slogan prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SloganArgs {
    /// Slogan theme, e.g. "sustainability" or "innovation".
    pub theme: String,
}

#[tool_router]
impl DemoServer {
    /// Echo any message you send back to you.
    #[tool(name = "echo_message")]
    async fn echo_message(
        &self,
        params: Parameters<EchoParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(format!(
            "You said: {}",
            params.0.message
        ))]))
    }

    /// Perform a simple addition, subtraction, multiplication, or division
    /// of two numbers.
    #[tool(name = "simple_calculation")]
    async fn simple_calculation(
        &self,
        params: Parameters<CalculationParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;
        let result = match p.operator {
            Operator::Add => p.a + p.b,
            Operator::Sub => p.a - p.b,
            Operator::Mul => p.a * p.b,
            Operator::Div => {
                if p.b == 0.0 {
                    return Ok(CallToolResult::error(vec![Content::text(
                        "Error: division by zero.",
                    )]));
                }
                p.a / p.b
            }
        };
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Result: {result}"
        ))]))
    }
}

#[prompt_router]
impl DemoServer {
    /// Generate a slogan for a given theme.
    #[prompt(name = "generate_slogan")]
    async fn generate_slogan(
        &self,
        params: Parameters<SloganArgs>,
    ) -> Result<GetPromptResult, rmcp::ErrorData> {
        let theme = params.0.theme;
        Ok(GetPromptResult {
            description: Some("Generate a slogan for the given theme".into()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                format!(
                    "Write a creative, catchy slogan for the theme \"{theme}\". \
                     Keep it short, punchy, and easy to spread."
                ),
            )],
        })
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for DemoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "mcp-demo".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Demo interactive server. Use 'echo_message' to echo text, \
                 'simple_calculation' for arithmetic, the 'status' resource for \
                 server state, and 'generate_slogan' for slogan prompts."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, rmcp::ErrorData> {
        Ok(ListResourcesResult {
            resources: vec![RawResource::new(STATUS_RESOURCE_URI, "status").no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, rmcp::ErrorData> {
        if request.uri == STATUS_RESOURCE_URI {
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(STATUS_TEXT, STATUS_RESOURCE_URI)],
            })
        } else {
            Err(rmcp::ErrorData::resource_not_found(
                "resource not found",
                Some(json!({ "uri": request.uri })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_owned()
    }

    #[tokio::test]
    async fn echo_prefixes_message() {
        let server = DemoServer::new();
        let result = server
            .echo_message(Parameters(EchoParams {
                message: "hello".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "You said: hello");
    }

    #[tokio::test]
    async fn calculation_covers_all_operators() {
        let server = DemoServer::new();
        for (operator, expected) in [
            (Operator::Add, "Result: 9"),
            (Operator::Sub, "Result: 3"),
            (Operator::Mul, "Result: 18"),
            (Operator::Div, "Result: 2"),
        ] {
            let result = server
                .simple_calculation(Parameters(CalculationParams {
                    a: 6.0,
                    b: 3.0,
                    operator,
                }))
                .await
                .unwrap();
            assert_eq!(text_of(&result), expected);
        }
    }

    #[tokio::test]
    async fn division_by_zero_is_a_tool_error() {
        let server = DemoServer::new();
        let result = server
            .simple_calculation(Parameters(CalculationParams {
                a: 1.0,
                b: 0.0,
                operator: Operator::Div,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn slogan_prompt_mentions_theme() {
        let server = DemoServer::new();
        let result = server
            .generate_slogan(Parameters(SloganArgs {
                theme: "sustainability".into(),
            }))
            .await
            .unwrap();
        let value = serde_json::to_value(&result).unwrap();
        let text = value["messages"][0]["content"]["text"]
            .as_str()
            .unwrap_or_default();
        assert!(text.contains("sustainability"));
    }
}
