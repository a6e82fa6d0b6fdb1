use std::sync::Arc;

use anyhow::Result;
use client_core::{ClientEvent, ScreenClient};
use shared::protocol::ChatMessage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Chat room: every stdin line is relayed through the hub, and the local log
/// only grows when the hub echoes the frame back.
pub async fn run(client: Arc<ScreenClient>, character: String) -> Result<()> {
    client.connect().await?;
    println!("ห้องแชท — พิมพ์ข้อความแล้วกด Enter, /quit เพื่อออก");

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Chat(message)) => {
                    if message.sender == character {
                        println!("{} (คุณ): {}", message.sender, message.text);
                    } else {
                        println!("{}: {}", message.sender, message.text);
                    }
                }
                Ok(ClientEvent::Disconnected) => {
                    println!("หลุดจากเซิร์ฟเวอร์");
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text == "/quit" {
                    break;
                }
                let message = ChatMessage {
                    sender: character.clone(),
                    text: text.to_string(),
                };
                if let Err(error) = client.send_chat(&message).await {
                    tracing::warn!(%error, "chat send failed");
                    println!("ส่งข้อความไม่สำเร็จ");
                }
            }
        }
    }
    client.close().await;
    Ok(())
}
