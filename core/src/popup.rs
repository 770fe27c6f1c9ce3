//! Detail popup markup.
//!
//! The markup is handed to the map backend as raw HTML, outside anything the
//! view manages. Its buttons reach back into the viewer through the command
//! ports named here.

use crate::{command_port, entity::Entity};

const BUTTON_CLASS: &str = "w-full mt-2 py-1.5 px-2.5 rounded text-white cursor-pointer transition-colors";

pub fn render_popup(entity: &Entity, following: bool) -> String {
    let action = if following {
        format!(
            r#"<button onclick="window.{}()" class="{BUTTON_CLASS} bg-red-500 hover:bg-red-600">Unfollow</button>"#,
            command_port::UNFOLLOW_PORT
        )
    } else {
        format!(
            r#"<button onclick="window.{}('{}')" class="{BUTTON_CLASS} bg-blue-500 hover:bg-blue-600">Follow</button>"#,
            command_port::FOLLOW_PORT,
            escape_js_single_quoted(&entity.id)
        )
    };

    format!(
        r#"<div class="font-sans min-w-[180px] text-black">
  <h3 class="m-0 mb-1 text-base font-bold">{name}</h3>
  <p class="m-0 text-xs text-gray-600">ID: {id}</p>
  <p class="m-0 text-xs text-gray-600">Lat: {lat:.5}</p>
  <p class="m-0 text-xs text-gray-600">Lng: {lng:.5}</p>
  {action}
</div>"#,
        name = escape_html(&entity.display_name),
        id = escape_html(entity.truncated_id()),
        lat = entity.latitude,
        lng = entity.longitude,
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Escape for a single-quoted JS string that itself sits inside a
/// double-quoted HTML attribute.
fn escape_js_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}
