use std::sync::Arc;

use anyhow::Result;
use client_core::{ClientEvent, ScreenClient};
use shared::domain::{FoodId, OrderId};
use shared::protocol::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Point of sale. Pending orders sit in the same list the hub appends
/// broadcast orders to; `confirm` submits everything currently listed as one
/// bulk order and clears it.
pub async fn run(client: Arc<ScreenClient>, mut table: String) -> Result<()> {
    client.connect().await?;
    if client.fetch_foods().await.is_err() {
        println!("โหลดเมนูไม่สำเร็จ");
    }
    if client.refresh_orders().await.is_err() {
        println!("โหลดออเดอร์ไม่สำเร็จ");
    }
    println!("หน้าสั่งอาหาร — โต๊ะ {table}");
    print_menu(&client).await;
    print_help();

    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Server(ServerEvent::NewOrder { order })) => {
                    println!(
                        "ออเดอร์จากหน้าอื่น: โต๊ะ {} — {} x{}",
                        order.table_no, order.name, order.qty
                    );
                }
                Ok(ClientEvent::Server(ServerEvent::Init { .. })) => print_orders(&client).await,
                Ok(ClientEvent::Disconnected) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&client, &mut table, &line).await {
                    break;
                }
            }
        }
    }
    client.close().await;
    Ok(())
}

async fn handle_command(client: &Arc<ScreenClient>, table: &mut String, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("menu") => print_menu(client).await,
        Some("order") => {
            let id = parts.next().and_then(|raw| raw.parse::<i64>().ok());
            let qty = parts
                .next()
                .and_then(|raw| raw.parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);
            let Some(id) = id else {
                println!("ใช้: order <รหัสเมนู> [จำนวน]");
                return true;
            };
            let food = client
                .foods()
                .await
                .into_iter()
                .find(|food| food.id == FoodId(id));
            match food {
                Some(food) => {
                    let order = client.add_local_order(&food, qty, table).await;
                    println!("เพิ่ม {} x{} (รายการ {})", order.name, order.qty, order.id);
                }
                None => println!("ไม่พบเมนูรหัส {id}"),
            }
        }
        Some("remove") => match parts.next().and_then(|raw| raw.parse::<i64>().ok()) {
            Some(id) if client.remove_order(OrderId(id)).await => {
                println!("ลบรายการ {id} แล้ว");
            }
            Some(id) => println!("ไม่พบรายการ {id}"),
            None => println!("ใช้: remove <รหัสรายการ>"),
        },
        Some("table") => {
            if let Some(no) = parts.next() {
                *table = no.to_string();
                println!("เปลี่ยนเป็นโต๊ะ {table}");
            } else {
                println!("ใช้: table <หมายเลขโต๊ะ>");
            }
        }
        Some("list") => print_orders(client).await,
        Some("confirm") => match client.submit_all_orders(table).await {
            Ok(0) => println!("ยังไม่มีรายการที่จะส่ง"),
            Ok(count) => println!("ส่งคำสั่งซื้อทั้งหมดเรียบร้อย ({count} รายการ)"),
            Err(error) => {
                tracing::warn!(%error, "bulk submission failed");
                println!("มีข้อผิดพลาดในการส่งคำสั่งซื้อ");
            }
        },
        Some("quit") => return false,
        Some(other) => println!("ไม่รู้จักคำสั่ง {other}"),
        None => {}
    }
    true
}

fn print_help() {
    println!("คำสั่ง: menu | order <รหัส> [จำนวน] | remove <รหัส> | table <โต๊ะ> | list | confirm | quit");
}

async fn print_menu(client: &ScreenClient) {
    let foods = client.foods().await;
    println!("--- เมนู ({} รายการ) ---", foods.len());
    for food in foods {
        println!("{}. {} — {:.2} บาท", food.id, food.name, food.price);
    }
}

async fn print_orders(client: &ScreenClient) {
    let orders = client.orders().await;
    if orders.is_empty() {
        println!("ยังไม่มีคำสั่งซื้อ");
        return;
    }
    let total: f64 = orders.iter().map(|order| order.line_total()).sum();
    for order in &orders {
        println!(
            "{}: โต๊ะ {} — {} x{} = {:.2} บาท",
            order.id,
            order.table_no,
            order.name,
            order.qty,
            order.line_total()
        );
    }
    println!("รวม {total:.2} บาท");
}
