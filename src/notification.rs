// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Owner notification rendering.
//!
//! All submitted values are escaped before they are placed into markup.

use crate::models::ContactForm;

const GENERAL_INQUIRY: &str = "General Inquiry";
const NOT_SPECIFIED: &str = "Not specified";

/// Rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Subject line for a submission. Line breaks become spaces.
pub fn subject_for(project_type: Option<&str>) -> String {
    let label: String = project_type
        .unwrap_or(GENERAL_INQUIRY)
        .chars()
        .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
        .collect();
    format!("New Contact Form Submission: {label}")
}

/// Build the subject, HTML body and plain-text body for a submission.
pub fn render(form: &ContactForm) -> Notification {
    let name = escape_html(&form.name);
    let email = escape_html(&form.email);
    let project_type = escape_html(form.project_type.as_deref().unwrap_or(NOT_SPECIFIED));
    let message = escape_html(&form.message);

    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #10b981; border-bottom: 2px solid #10b981; padding-bottom: 10px;">New Contact Form Submission</h1>
    <div style="margin-top: 30px;">
      <h2 style="color: #1f2937; margin-bottom: 20px;">Contact Information</h2>
      <div style="margin-bottom: 15px;">
        <strong style="color: #4b5563;">Name:</strong>
        <p style="margin: 5px 0; color: #111827;">{name}</p>
      </div>
      <div style="margin-bottom: 15px;">
        <strong style="color: #4b5563;">Email:</strong>
        <p style="margin: 5px 0; color: #111827;"><a href="mailto:{email}" style="color: #10b981; text-decoration: none;">{email}</a></p>
      </div>
      <div style="margin-bottom: 15px;">
        <strong style="color: #4b5563;">Project Type:</strong>
        <p style="margin: 5px 0; color: #111827;">{project_type}</p>
      </div>
    </div>
    <div style="margin-top: 30px;">
      <h2 style="color: #1f2937; margin-bottom: 15px;">Message</h2>
      <div style="background-color: #f9fafb; padding: 20px; border-radius: 8px; border-left: 4px solid #10b981; white-space: pre-wrap; color: #111827;">{message}</div>
    </div>
    <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #e5e7eb; font-size: 12px; color: #6b7280;">
      <p>This email was sent from your portfolio contact form.</p>
      <p>Reply directly to this email to respond to {name}.</p>
    </div>
  </div>
</div>"##
    );

    let text = format!(
        "New Contact Form Submission\n\n\
         Name: {}\n\
         Email: {}\n\
         Project Type: {}\n\n\
         Message:\n{}\n\n\
         Reply directly to this email to respond to {}.\n",
        form.name,
        form.email,
        form.project_type.as_deref().unwrap_or(NOT_SPECIFIED),
        form.message,
        form.name,
    );

    Notification {
        subject: subject_for(form.project_type.as_deref()),
        html,
        text,
    }
}
