use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use client_core::{ClientEvent, ScreenClient};
use shared::domain::{TodoId, TodoStatus};
use shared::protocol::{CreateTodoRequest, ServerEvent, UpdateTodoRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Team todo board. Mutations go over REST; the board re-renders whenever
/// the hub pushes a replacement list, and after our own mutations we
/// re-fetch so the screen does not wait on the broadcast.
pub async fn run(client: Arc<ScreenClient>, assignee: String) -> Result<()> {
    client.connect().await?;
    if client.refresh_todos().await.is_err() {
        println!("โหลดรายการงานไม่สำเร็จ");
    }
    render_board(&client).await;
    print_help();

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(
                    ServerEvent::NewTodo { .. } | ServerEvent::UpdateTodo { .. },
                )) => render_board(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&client, &assignee, line.trim()).await {
                    break;
                }
            }
        }
    }
    client.close().await;
    Ok(())
}

fn print_help() {
    println!(
        "คำสั่ง: add <ชื่องาน>|<วัน>|<โน้ต> | status <รหัส> <1-3> | \
         edit <รหัส>|<ชื่องาน>|<วัน>|<โน้ต> | delete <รหัส> | list | quit"
    );
}

async fn handle_command(client: &Arc<ScreenClient>, assignee: &str, line: &str) -> bool {
    match line {
        "quit" => return false,
        "list" => {
            render_board(client).await;
            return true;
        }
        "" => return true,
        _ => {}
    }

    if let Some(rest) = line.strip_prefix("add ") {
        let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
        let title = fields.first().copied().unwrap_or_default();
        if title.is_empty() {
            println!("กรอกชื่อรายการ");
            return true;
        }
        let request = CreateTodoRequest {
            title: title.to_string(),
            assignee: assignee.to_string(),
            duration_days: fields.get(1).and_then(|raw| raw.parse().ok()).unwrap_or(1),
            note: fields.get(2).copied().unwrap_or_default().to_string(),
        };
        match client.add_todo(&request).await {
            Ok(()) => refresh_and_render(client).await,
            Err(error) => {
                tracing::warn!(%error, "todo creation failed");
                println!("เพิ่มรายการไม่สำเร็จ");
            }
        }
        return true;
    }

    if let Some(rest) = line.strip_prefix("status ") {
        let mut parts = rest.split_whitespace();
        let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
        let status = parts
            .next()
            .and_then(|raw| raw.parse::<usize>().ok())
            .and_then(|index| TodoStatus::ALL.get(index.wrapping_sub(1)).copied());
        match (id, status) {
            (Some(id), Some(status)) => {
                match client.change_todo_status(TodoId(id), status).await {
                    Ok(()) => refresh_and_render(client).await,
                    Err(error) => {
                        tracing::warn!(%error, "todo status update failed");
                        println!("อัปเดตสถานะไม่สำเร็จ");
                    }
                }
            }
            _ => println!("ใช้: status <รหัส> <1-3>"),
        }
        return true;
    }

    if let Some(rest) = line.strip_prefix("edit ") {
        let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
        let id = fields.first().and_then(|raw| raw.parse::<i64>().ok());
        let title = fields.get(1).copied().unwrap_or_default();
        let (Some(id), false) = (id, title.is_empty()) else {
            println!("ใช้: edit <รหัส>|<ชื่องาน>|<วัน>|<โน้ต>");
            return true;
        };
        let existing = client
            .todos()
            .await
            .into_iter()
            .find(|todo| todo.id == TodoId(id));
        let Some(existing) = existing else {
            println!("ไม่พบรายการ {id}");
            return true;
        };
        let duration_days: u32 = fields.get(2).and_then(|raw| raw.parse().ok()).unwrap_or(1);
        let request = UpdateTodoRequest {
            title: title.to_string(),
            note: fields.get(3).copied().unwrap_or_default().to_string(),
            start_date: existing.start_date,
            due_date: existing.start_date + Duration::days(i64::from(duration_days)),
            duration_days,
        };
        match client.update_todo(TodoId(id), &request).await {
            Ok(()) => refresh_and_render(client).await,
            Err(error) => {
                tracing::warn!(%error, "todo edit failed");
                println!("แก้ไขรายการไม่สำเร็จ");
            }
        }
        return true;
    }

    if let Some(rest) = line.strip_prefix("delete ") {
        match rest.trim().parse::<i64>() {
            Ok(id) => match client.delete_todo(TodoId(id)).await {
                Ok(()) => refresh_and_render(client).await,
                Err(error) => {
                    tracing::warn!(%error, "todo delete failed");
                    println!("ลบรายการไม่สำเร็จ");
                }
            },
            Err(_) => println!("ใช้: delete <รหัส>"),
        }
        return true;
    }

    print_help();
    true
}

async fn refresh_and_render(client: &ScreenClient) {
    let _ = client.refresh_todos().await;
    render_board(client).await;
}

async fn render_board(client: &ScreenClient) {
    let todos = client.todos().await;
    println!("--- บอร์ดงาน ({} รายการ) ---", todos.len());
    for status in TodoStatus::ALL {
        println!("[{status}]");
        for todo in todos.iter().filter(|todo| todo.status == status) {
            print!(
                "  {}: {} ({}) ครบกำหนด {}",
                todo.id,
                todo.title,
                todo.assignee,
                todo.due_date.format("%Y-%m-%d")
            );
            if todo.note.is_empty() {
                println!();
            } else {
                println!(" — {}", todo.note);
            }
        }
    }
}
