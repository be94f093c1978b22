//! stdio 传输
//!
//! 每行一条 JSON 消息，响应同样一行一条写回。日志走 stderr，不会混进 stdout。

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::McpServer;

/// 在任意读写端上运行消息循环，读到 EOF 时返回
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(reply) = server.handle_message(line).await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    log::info!("stdin 已关闭，MCP 服务退出");
    Ok(())
}

/// 在进程的 stdin/stdout 上提供服务
pub async fn serve_stdio(server: McpServer) -> std::io::Result<()> {
    log::info!("MCP 服务已在 stdio 上启动");
    serve(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
