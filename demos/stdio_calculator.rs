//! Line-delimited JSON-RPC calculator over stdin/stdout
//!
//! Each input line is one JSON-RPC message (single or batch). Try:
//!
//! ```text
//! {"jsonrpc":"2.0","method":"add","params":[5,7],"id":1}
//! {"jsonrpc":"2.0","method":"divide","params":{"dividend":1,"divisor":0},"id":2}
//! [{"jsonrpc":"2.0","method":"add","params":[1,2],"id":3},{"jsonrpc":"2.0","method":"rpc.describe","id":4}]
//! ```

use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use typedrpc::server::{from_fn, Named, TracingMiddleware};
use typedrpc::{from_typed_fn, BatchMode, Dispatcher, Error, JsonRpcErrorData, MethodSignature, TypeDescriptor};

#[derive(Deserialize)]
struct DivideParams {
    dividend: f64,
    divisor: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter("info")
        .init();

    let dispatcher = Dispatcher::builder()
        .method(
            "add",
            from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
            MethodSignature::builder()
                .param("a", TypeDescriptor::Integer)
                .param("b", TypeDescriptor::Integer)
                .returns(TypeDescriptor::Integer)
                .description("Add two integers")
                .build()?,
        )
        .method(
            "divide",
            from_typed_fn(|Named(params): Named<DivideParams>| async move {
                if params.divisor == 0.0 {
                    return Err(Error::JsonRpc(JsonRpcErrorData::new(1, "Division by zero")));
                }
                Ok(params.dividend / params.divisor)
            }),
            MethodSignature::builder()
                .param("dividend", TypeDescriptor::Float)
                .param("divisor", TypeDescriptor::Float)
                .returns(TypeDescriptor::Float)
                .build()?,
        )
        .method(
            "sleep",
            from_fn(|_ctx, args| async move {
                let millis: u64 = args.get_as("millis")?;
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok::<_, Error>(serde_json::Value::Null)
            }),
            MethodSignature::builder()
                .param_with_default("millis", TypeDescriptor::Integer, serde_json::json!(100))
                .returns(TypeDescriptor::Null)
                .build()?,
        )
        .batch_mode(BatchMode::Parallel)
        .max_batch_size(64)
        .use_middleware(std::sync::Arc::new(TracingMiddleware))
        .build()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = dispatcher.handle(&line).await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
