//! HTML rendering for provider invitations.

use super::model::ProviderInvite;

const DEFAULT_CUSTOMER: &str = "A client";
const DEFAULT_CONTRACT: &str = "a contract";

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a deal value the way en-GB locale grouping does, with a pound sign:
/// `"1000"` becomes `£1,000`. At most three fractional digits are kept.
/// Values that do not parse as a number are returned as given.
pub fn format_gbp(raw: &str) -> String {
    let trimmed = raw.trim();
    let cleaned: String = trimmed
        .trim_start_matches('£')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let value = match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return trimmed.to_string(),
    };

    let fixed = format!("{:.3}", value.abs());
    let fixed = fixed.trim_end_matches('0').trim_end_matches('.');
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed, None),
    };

    let sign = if value < 0.0 && fixed != "0" { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}£{}.{}", sign, group_thousands(int_part), frac),
        None => format!("{}£{}", sign, group_thousands(int_part)),
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

pub fn invite_subject(invite: &ProviderInvite) -> String {
    format!(
        "{} has invited you to negotiate: {}",
        or_default(&invite.customer_company, DEFAULT_CUSTOMER),
        or_default(&invite.contract_title, DEFAULT_CONTRACT)
    )
}

/// Render the invitation email body.
pub fn render_invite_html(invite: &ProviderInvite) -> String {
    let provider_name = escape_html(or_default(&invite.provider_name, "there"));
    let customer_company = escape_html(or_default(&invite.customer_company, DEFAULT_CUSTOMER));
    let customer_name = invite
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|name| format!(" ({})", escape_html(name)))
        .unwrap_or_default();
    let contract_title = escape_html(or_default(&invite.contract_title, DEFAULT_CONTRACT));
    let invite_url = escape_html(or_default(&invite.invite_url, "#"));

    let mut details = String::new();
    if let Some(company) = invite.provider_company.as_deref().filter(|v| !v.trim().is_empty()) {
        details.push_str(&format!(
            "<p style=\"margin:4px 0;\"><strong>Your company:</strong> {}</p>\n",
            escape_html(company.trim())
        ));
    }
    if let Some(service) = invite
        .service_description
        .as_deref()
        .filter(|v| !v.trim().is_empty())
    {
        details.push_str(&format!(
            "<p style=\"margin:4px 0;\"><strong>Service required:</strong> {}</p>\n",
            escape_html(service.trim())
        ));
    }
    if let Some(value) = invite.deal_value.as_deref().filter(|v| !v.trim().is_empty()) {
        details.push_str(&format!(
            "<p style=\"margin:4px 0;\"><strong>Estimated value:</strong> {}</p>\n",
            escape_html(&format_gbp(value))
        ));
    }

    let message = invite
        .personal_message
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|m| {
            format!(
                "<blockquote style=\"border-left:3px solid #2563eb;margin:16px 0;padding:8px 16px;color:#334155;\">{}</blockquote>\n",
                escape_html(m.trim())
            )
        })
        .unwrap_or_default();

    let reference = invite
        .invite_token
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|t| {
            format!(
                "<p style=\"font-size:12px;color:#94a3b8;\">Invitation reference: {}</p>\n",
                escape_html(t.trim())
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{contract_title}</title></head>
<body style="font-family:Arial,Helvetica,sans-serif;background:#f8fafc;margin:0;padding:24px;">
<div style="max-width:600px;margin:0 auto;background:#ffffff;border-radius:8px;padding:32px;">
<h1 style="font-size:22px;color:#0f172a;margin-top:0;">CLARENCE</h1>
<p>Hello {provider_name},</p>
<p>{customer_company}{customer_name} has invited you to negotiate <strong>{contract_title}</strong> on CLARENCE.</p>
{message}<div style="background:#f1f5f9;border-radius:6px;padding:16px;margin:16px 0;">
<p style="margin:4px 0;"><strong>Contract:</strong> {contract_title}</p>
{details}</div>
<p style="text-align:center;margin:32px 0;">
<a href="{invite_url}" style="background:#2563eb;color:#ffffff;padding:12px 24px;border-radius:6px;text-decoration:none;">Review the invitation</a>
</p>
<p style="font-size:13px;color:#64748b;">If the button does not work, paste this link into your browser:<br>{invite_url}</p>
{reference}</div>
</body>
</html>
"#
    )
}
