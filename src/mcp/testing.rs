//! In-process fake of the eBird MCP server for tests.

use super::transport::{McpTransport, StdioTransport};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Clone, Copy, PartialEq)]
enum Behavior {
    Answer,
    RejectInitialize,
    Silent,
}

pub(crate) struct FakeEbirdServer {
    transport: Arc<StdioTransport>,
    methods: Arc<Mutex<Vec<String>>>,
}

impl FakeEbirdServer {
    pub(crate) fn start() -> Self {
        Self::spawn(Behavior::Answer)
    }

    /// A server that rejects the initialize request.
    pub(crate) fn rejecting_handshake() -> Self {
        Self::spawn(Behavior::RejectInitialize)
    }

    /// A server that reads requests and never replies.
    pub(crate) fn silent() -> Self {
        Self::spawn(Behavior::Silent)
    }

    fn spawn(behavior: Behavior) -> Self {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, mut server_write) = tokio::io::split(server_side);
        let methods = Arc::new(Mutex::new(Vec::new()));
        let seen = methods.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let request: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                let method = request["method"].as_str().unwrap_or_default().to_string();
                seen.lock().unwrap().push(method.clone());

                let Some(id) = request.get("id").cloned() else {
                    continue;
                };
                if behavior == Behavior::Silent {
                    continue;
                }
                let reject_initialize = behavior == Behavior::RejectInitialize;
                let reply = match respond(&method, &request["params"], reject_initialize) {
                    Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                    Err(message) => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32000, "message": message}
                    }),
                };
                if server_write
                    .write_all(format!("{}\n", reply).as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            transport: Arc::new(StdioTransport::from_streams(client_read, client_write)),
            methods,
        }
    }

    pub(crate) fn transport(&self) -> Arc<dyn McpTransport> {
        self.transport.clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }
}

fn respond(method: &str, params: &Value, reject_initialize: bool) -> Result<Value, String> {
    match method {
        "initialize" if reject_initialize => Err("invalid eBird API key".to_string()),
        "initialize" => Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "ebird-mcp-server", "version": "1.0.0"}
        })),
        "tools/list" => match params.get("cursor").and_then(Value::as_str) {
            None => Ok(json!({
                "tools": [
                    {
                        "name": "list_hotspots",
                        "description": "List birding hotspots near a location",
                        "inputSchema": {
                            "type": "object",
                            "properties": {"lat": {"type": "number"}, "lng": {"type": "number"}},
                            "required": ["lat", "lng"]
                        }
                    },
                    {
                        "name": "search_observations",
                        "description": "Recent observations near a location",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "lat": {"type": "number"},
                                "lng": {"type": "number"},
                                "species": {"type": "string"}
                            },
                            "required": ["lat", "lng"]
                        }
                    }
                ],
                "nextCursor": "page-2"
            })),
            Some(_) => Ok(json!({
                "tools": [{
                    "name": "get_taxonomy",
                    "description": "Look up eBird taxonomy",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"species": {"type": "string"}}
                    }
                }]
            })),
        },
        "tools/call" => {
            let text = match params["name"].as_str() {
                Some("list_hotspots") => {
                    "1. Mount Auburn Cemetery (L207391)\n2. Fresh Pond Reservation (L208436)"
                }
                Some("search_observations") => {
                    "Bald Eagle (Haliaeetus leucocephalus) - 3 reports at Discovery Park"
                }
                Some("get_taxonomy") => "Haliaeetus leucocephalus, speciesCode baleag",
                _ => {
                    return Ok(json!({
                        "content": [{"type": "text", "text": "Unknown tool"}],
                        "isError": true
                    }))
                }
            };
            Ok(json!({"content": [{"type": "text", "text": text}]}))
        }
        other => Err(format!("Method not found: {}", other)),
    }
}
