// src/notify/email.rs
//
// Ticket delivery email: an HTML document with one QR image per ticket,
// grouped by pass type, plus a price/quantity summary table. Assembly is
// kept separate from transport so it can be tested without an SMTP server.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::BTreeMap;

use crate::config::SmtpConfig;
use crate::fulfillment::GeneratedTicket;
use crate::models::{Order, OrderPass};

// Buyer names and pass labels come from user input and must not be able to
// inject markup into the email body.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_tickets_html(order: &Order, passes: &[OrderPass], tickets: &[GeneratedTicket]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&GeneratedTicket>> = BTreeMap::new();
    for ticket in tickets {
        grouped.entry(ticket.pass_type.as_str()).or_default().push(ticket);
    }

    let buyer = escape_html(order.buyer_name.as_deref().unwrap_or("there"));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">");
    html.push_str(&format!(
        "<h2>Your tickets for order #{}</h2><p>Hi {buyer}, your order has been confirmed. \
         Present each QR code at the entrance.</p>",
        order.id
    ));

    for (pass_type, group) in &grouped {
        html.push_str(&format!("<h3>{}</h3>", escape_html(pass_type)));
        for (i, ticket) in group.iter().enumerate() {
            html.push_str(&format!(
                "<div style=\"margin:12px 0\"><p>Ticket {} of {}</p>\
                 <img src=\"{}\" alt=\"ticket QR\" width=\"240\" height=\"240\"/></div>",
                i + 1,
                group.len(),
                ticket.qr_image_url
            ));
        }
    }

    html.push_str(
        "<h3>Summary</h3><table border=\"1\" cellpadding=\"6\" cellspacing=\"0\">\
         <tr><th>Pass</th><th>Unit price</th><th>Quantity</th></tr>",
    );
    for pass in passes {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{} TND</td><td>{}</td></tr>",
            escape_html(&pass.pass_type),
            pass.unit_price,
            pass.quantity
        ));
    }
    html.push_str(&format!(
        "</table><p><strong>Total: {} TND</strong></p></body></html>",
        order.total_price
    ));

    html
}

pub fn render_tickets_text(order: &Order, tickets: &[GeneratedTicket]) -> String {
    format!(
        "Your order #{} is confirmed. {} ticket(s) were issued, total {} TND. \
         Open this email in an HTML-capable client to see the QR codes.",
        order.id,
        tickets.len(),
        order.total_price
    )
}

pub async fn send_tickets(
    smtp: &SmtpConfig,
    order: &Order,
    passes: &[OrderPass],
    tickets: &[GeneratedTicket],
) -> Result<(), String> {
    let to_address = order
        .buyer_email
        .as_deref()
        .ok_or_else(|| "order has no buyer email".to_string())?;

    let from: Mailbox = format!("{} <{}>", smtp.from_name, smtp.from_address)
        .parse()
        .map_err(|e| format!("invalid from address: {e}"))?;
    let to: Mailbox = to_address
        .parse()
        .map_err(|e| format!("invalid recipient address: {e}"))?;

    let html = render_tickets_html(order, passes, tickets);
    let text = render_tickets_text(order, tickets);

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(format!("Your tickets - order #{}", order.id))
        .multipart(MultiPart::alternative_plain_html(text, html))
        .map_err(|e| format!("email build: {e}"))?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        .map_err(|e| format!("smtp relay: {e}"))?
        .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
        .build();

    mailer
        .send(message)
        .await
        .map_err(|e| format!("smtp send: {e}"))?;

    Ok(())
}
