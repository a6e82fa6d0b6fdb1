use std::sync::Arc;

use anyhow::Result;
use client_core::{ClientEvent, ScreenClient};
use shared::domain::{TicketId, TicketStatus};
use shared::protocol::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Intake form plus the live ticket list. The list is seeded by the hub's
/// `init` frame alone; this screen never fetches `/tickets` over REST.
pub async fn run_intake(client: Arc<ScreenClient>) -> Result<()> {
    client.connect().await?;
    println!("แจ้งซ่อม — ใช้: report <เครื่องจักร>|<อาการ>|<ผู้แจ้ง> (list | quit)");

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(
                    ServerEvent::Init { .. }
                    | ServerEvent::NewTicket { .. }
                    | ServerEvent::UpdateStatus { .. },
                )) => render_list(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_intake_command(&client, line.trim()).await {
                    break;
                }
            }
        }
    }
    client.close().await;
    Ok(())
}

async fn handle_intake_command(client: &Arc<ScreenClient>, line: &str) -> bool {
    match line {
        "quit" => return false,
        "list" => {
            render_list(client).await;
            return true;
        }
        "" => return true,
        _ => {}
    }
    let Some(rest) = line.strip_prefix("report ") else {
        println!("ใช้: report <เครื่องจักร>|<อาการ>|<ผู้แจ้ง>");
        return true;
    };
    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
    if fields.len() != 3 || fields.iter().any(|field| field.is_empty()) {
        println!("กรอกทุกช่องก่อน");
        return true;
    }
    match client.create_ticket(fields[0], fields[1], fields[2]).await {
        Ok(()) => println!("ส่งใบแจ้งซ่อมแล้ว"),
        Err(error) => {
            tracing::warn!(%error, "ticket submission failed");
            println!("ส่งใบแจ้งซ่อมไม่สำเร็จ");
        }
    }
    true
}

/// Admin screen: live ticket list with `status <id> <1-4>` updates and a
/// toast line for each incoming ticket. Seeded by `init`, like the intake.
pub async fn run_admin(client: Arc<ScreenClient>) -> Result<()> {
    client.connect().await?;
    println!("คำสั่ง: status <รหัส> <1-4> | list | quit");
    print_status_legend();

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(ServerEvent::NewTicket { ticket })) => {
                    println!("ใบแจ้งซ่อมใหม่ — {}: {}", ticket.machine, ticket.detail);
                }
                Ok(ClientEvent::Server(ServerEvent::UpdateStatus { ticket })) => {
                    println!("ใบแจ้งซ่อม {} เปลี่ยนเป็น {}", ticket.id, ticket.status);
                }
                Ok(ClientEvent::Server(ServerEvent::Init { .. })) => render_list(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_admin_command(&client, line.trim()).await {
                    break;
                }
            }
        }
    }
    client.close().await;
    Ok(())
}

async fn handle_admin_command(client: &Arc<ScreenClient>, line: &str) -> bool {
    match line {
        "quit" => return false,
        "list" => {
            render_list(client).await;
            return true;
        }
        "" => return true,
        _ => {}
    }
    let Some(rest) = line.strip_prefix("status ") else {
        println!("คำสั่ง: status <รหัส> <1-4> | list | quit");
        return true;
    };
    let mut parts = rest.split_whitespace();
    let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
    let status = parts
        .next()
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|index| TicketStatus::ALL.get(index.wrapping_sub(1)).copied());
    match (id, status) {
        (Some(id), Some(status)) => {
            if let Err(error) = client.update_ticket_status(TicketId(id), status).await {
                tracing::warn!(%error, "status update failed");
                println!("อัปเดตสถานะไม่สำเร็จ");
            }
        }
        _ => println!("ใช้: status <รหัส> <1-4>"),
    }
    true
}

/// Read-only dashboard: a REST snapshot seeds the list, then counts and the
/// full list are re-rendered on every hub frame.
pub async fn run_dashboard(client: Arc<ScreenClient>) -> Result<()> {
    client.connect().await?;
    if client.refresh_tickets().await.is_err() {
        println!("โหลดใบแจ้งซ่อมไม่สำเร็จ");
    }
    render_dashboard(&client).await;
    println!("(กด Enter เพื่อแสดงใหม่, quit เพื่อออก)");

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(_)) => render_dashboard(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim() == "quit" => break,
                Some(_) => render_dashboard(&client).await,
                None => break,
            },
        }
    }
    client.close().await;
    Ok(())
}

fn print_status_legend() {
    for (index, status) in TicketStatus::ALL.iter().enumerate() {
        print!("  {} = {}", index + 1, status);
    }
    println!();
}

async fn render_list(client: &ScreenClient) {
    let tickets = client.tickets().await;
    if tickets.is_empty() {
        println!("ยังไม่มีใบแจ้งซ่อม");
        return;
    }
    println!("--- ใบแจ้งซ่อม ({} ใบ) ---", tickets.len());
    for ticket in tickets {
        println!(
            "[{}] {} — {} | ผู้แจ้ง: {} | สถานะ: {}",
            ticket.id, ticket.machine, ticket.detail, ticket.reporter, ticket.status
        );
    }
}

async fn render_dashboard(client: &ScreenClient) {
    let tickets = client.tickets().await;
    println!("--- สรุปงานแจ้งซ่อม ---");
    for status in TicketStatus::ALL {
        let count = tickets
            .iter()
            .filter(|ticket| ticket.status == status)
            .count();
        println!("{status}: {count}");
    }
    render_list(client).await;
}
