use std::sync::Arc;

use anyhow::Result;
use client_core::{ClientEvent, ScreenClient};
use shared::protocol::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Kitchen display: a REST snapshot seeds the list, then every `new_order`
/// frame is announced as it arrives. Any stdin line re-renders; `quit` exits.
pub async fn run(client: Arc<ScreenClient>) -> Result<()> {
    client.connect().await?;
    if client.refresh_orders().await.is_err() {
        println!("โหลดออเดอร์ไม่สำเร็จ");
    }
    render(&client).await;
    println!("(กด Enter เพื่อแสดงรายการใหม่, quit เพื่อออก)");

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(ServerEvent::NewOrder { order })) => {
                    println!(
                        "ออเดอร์ใหม่: โต๊ะ {} — {} x{}",
                        order.table_no, order.name, order.qty
                    );
                }
                Ok(ClientEvent::Server(ServerEvent::Init { .. })) => render(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim() == "quit" => break,
                Some(_) => render(&client).await,
                None => break,
            },
        }
    }
    client.close().await;
    Ok(())
}

// Newest order first, like the kitchen board.
async fn render(client: &ScreenClient) {
    let orders = client.orders().await;
    println!("--- ออเดอร์ในครัว ({} รายการ) ---", orders.len());
    for order in orders.into_iter().rev() {
        println!(
            "[{}] โต๊ะ {} — {} x{}",
            order.created_at.format("%H:%M"),
            order.table_no,
            order.name,
            order.qty
        );
    }
}
