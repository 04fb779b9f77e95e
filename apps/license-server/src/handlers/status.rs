// [apps/license-server/src/handlers/status.rs]
//! `/license/status/all`. Renders the full session table as HTML with a
//! client-side search filter — the only endpoint besides health that
//! produces non-JSON output (spec.md §4.H).

use axum::extract::State;
use axum::response::Html;

use crate::state::AppState;

pub async fn status_all(State(state): State<AppState>) -> Html<String> {
    let sessions = state.pool().list_all();

    let mut rows = String::new();
    for session in &sessions {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&session.session_key),
            html_escape(&session.client_id),
            html_escape(&session.hostname),
            html_escape(&session.username),
            if session.active { "active" } else { "inactive" },
        ));
    }

    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>License sessions</title></head>
<body>
<input id="search" type="text" placeholder="Filter sessions...">
<table id="sessions">
<thead><tr><th>Session key</th><th>Client</th><th>Host</th><th>User</th><th>State</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>
<script>
document.getElementById('search').addEventListener('input', function (event) {{
    var needle = event.target.value.toLowerCase();
    document.querySelectorAll('#sessions tbody tr').forEach(function (row) {{
        row.style.display = row.textContent.toLowerCase().includes(needle) ? '' : 'none';
    }});
}});
</script>
</body>
</html>"#
    );

    Html(page)
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
