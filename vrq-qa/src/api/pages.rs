//! HTML pages for the participant UI
//!
//! Pages are rendered with `format!`; every value that came from the
//! filesystem or the participant goes through [`escape_html`].

use uuid::Uuid;
use vrq_common::session::CurrentQuestion;
use vrq_common::{Choice, FlushReport};

pub const TITLE: &str = "Rating the Realism of Vehicles in images";

const INSTRUCTIONS: &str = "In this questionnaire, you will see pairs of images that show the same scene. \
The two images are identical, except that in one of them, the vehicle is highlighted with a red dashed box to help you locate it. \
Your task is to rate how real or natural the vehicle in the box looks within the whole image. \
Note that in some images, the vehicle has been edited.";

const QUESTION_TEXT: &str = "How realistic / natural does the vehicle inside the red box look? \
That is, does it look like a real vehicle that naturally belongs in the scene and doesn't stand out?";

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }
        header {
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 20px;
            margin-bottom: 20px;
        }
        h1 { font-size: 26px; color: #4a9eff; }
        h2 { color: #4a9eff; margin: 20px 0 10px; }
        .content { padding: 0 20px 40px; max-width: 1400px; }
        .instructions { color: #bbb; margin-bottom: 20px; }
        .pair { display: flex; gap: 20px; flex-wrap: wrap; }
        figure { flex: 1; min-width: 300px; }
        figure img { max-width: 100%; border: 1px solid #3a3a3a; }
        figcaption { color: #888; font-size: 14px; margin-top: 5px; }
        .choices { margin: 15px 0; }
        .choices label { display: block; padding: 6px 0; cursor: pointer; }
        .warning {
            background: #f59e0b;
            color: #1a1a1a;
            padding: 10px 15px;
            border-radius: 4px;
            margin: 15px 0;
            font-weight: 600;
        }
        .success {
            background: #10b981;
            color: #fff;
            padding: 10px 15px;
            border-radius: 4px;
            margin: 15px 0;
        }
        .button {
            display: inline-block;
            padding: 10px 20px;
            background: #4a9eff;
            color: white;
            border: none;
            border-radius: 4px;
            font-weight: 600;
            font-size: 16px;
            cursor: pointer;
            text-decoration: none;
        }
        .button:hover { background: #3a8eef; }
"#;

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-encode one URL path segment
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
    <header><h1>{heading}</h1></header>
    <div class="content">
{body}
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        heading = TITLE,
        body = body,
    )
}

/// GET / content
pub fn landing_page(pool_size: usize) -> String {
    let action = if pool_size == 0 {
        r#"<div class="warning">There are no questions to ask right now. Please check back later.</div>"#
            .to_string()
    } else {
        r#"<form method="post" action="/start">
            <button class="button" type="submit">Start</button>
        </form>"#
            .to_string()
    };

    let body = format!(
        r#"        <p class="instructions">{instructions}</p>
        {action}"#,
        instructions = INSTRUCTIONS,
        action = action,
    );
    layout(TITLE, &body)
}

/// One question with its image pair and the rating form
pub fn question_page(token: Uuid, question: &CurrentQuestion<'_>, warning: Option<&str>) -> String {
    let item = question.item;
    let left_src = format!(
        "/images/plain/{}/{}",
        encode_path_segment(&item.group),
        encode_path_segment(&item.left_image_id)
    );
    let right_src = format!(
        "/images/annotated/{}/{}",
        encode_path_segment(&item.annotated_group),
        encode_path_segment(&item.right_image_id)
    );

    let warning_html = warning
        .map(|w| format!(r#"<div class="warning">{}</div>"#, escape_html(w)))
        .unwrap_or_default();

    let options: String = Choice::ALL
        .iter()
        .map(|choice| {
            let label = escape_html(choice.label());
            format!(
                r#"                <label><input type="radio" name="choice" value="{label}"> {label}</label>
"#
            )
        })
        .collect();

    let body = format!(
        r#"        <p class="instructions">{instructions}</p>
        <h2>Question {number} of {total}</h2>
        <div class="pair">
            <figure>
                <img src="{left_src}" alt="Image">
                <figcaption>Image</figcaption>
            </figure>
            <figure>
                <img src="{right_src}" alt="Image with marked vehicle">
                <figcaption>Image where the vehicle is marked with a red dashed box</figcaption>
            </figure>
        </div>
        <p>{question_text}</p>
        {warning_html}
        <form method="post" action="/survey/{token}/answer">
            <input type="hidden" name="question_number" value="{number}">
            <div class="choices">
                <strong>Your answer:</strong>
{options}            </div>
            <button class="button" type="submit">Next</button>
        </form>"#,
        instructions = INSTRUCTIONS,
        number = question.number,
        total = question.total,
        left_src = left_src,
        right_src = right_src,
        question_text = QUESTION_TEXT,
        warning_html = warning_html,
        token = token,
        options = options,
    );
    layout(&format!("Question {} of {}", question.number, question.total), &body)
}

/// Thank-you page shown once the session is done
pub fn completion_page(report: Option<FlushReport>) -> String {
    let detail = match report {
        Some(report) if !report.is_complete() => format!(
            r#"<div class="warning">{} of {} answers could not be saved.</div>"#,
            report.failure_count,
            report.attempted()
        ),
        _ => String::new(),
    };

    let body = format!(
        r#"        <div class="success">Thank you! Your responses have been recorded.</div>
        {detail}"#,
        detail = detail,
    );
    layout("Thank you", &body)
}

/// Generic message page
pub fn message_page(title: &str, message: &str) -> String {
    let body = format!(
        r#"        <h2>{title}</h2>
        <p>{message}</p>
        <p><a class="button" href="/">Back to start</a></p>"#,
        title = escape_html(title),
        message = escape_html(message),
    );
    layout(title, &body)
}
