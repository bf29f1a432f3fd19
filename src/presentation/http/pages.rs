use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use htmlescape::{encode_attribute, encode_minimal};
use serde::Deserialize;

use crate::application::ports::identity::AuthUser;
use crate::application::services::sync::BookmarkFeed;
use crate::bootstrap::app_context::AppContext;
use crate::domain::bookmarks::bookmark::Bookmark;
use crate::presentation::http::auth::{self, SessionToken};

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/", get(home)).with_state(ctx)
}

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    error: Option<String>,
}

/// Landing or dashboard, chosen by a single current-user read at render
/// time. A token that no longer resolves renders the same as no token.
pub async fn home(
    State(ctx): State<AppContext>,
    token: Option<SessionToken>,
    Query(params): Query<HomeParams>,
) -> Html<String> {
    let user = match &token {
        Some(t) => auth::require_user(&ctx, t).await.ok(),
        None => None,
    };
    match user {
        None => Html(render_landing(params.error.as_deref())),
        Some(user) => {
            let mut feed =
                BookmarkFeed::new(ctx.bookmark_repo(), ctx.change_publisher(), user.id.clone());
            feed.load().await;
            Html(render_dashboard(&user, &feed))
        }
    }
}

fn render_landing(error: Option<&str>) -> String {
    let banner = if error == Some("auth_failed") {
        "<p class=\"error\">Sign-in failed. Please try again.</p>"
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n<title>Linkbox</title>\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n</head>\n<body>\n<main>\n<h1>Linkbox</h1>\n<p>Sign in to manage your bookmarks</p>\n{banner}\n<a href=\"/auth/sign-in\">Sign in</a>\n</main>\n</body>\n</html>\n"
    )
}

fn render_dashboard(user: &AuthUser, feed: &BookmarkFeed) -> String {
    let label = encode_minimal(user.display_label());
    let section = render_bookmark_section(feed.items(), feed.error(), feed.is_loading());
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n<title>Linkbox</title>\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n</head>\n<body>\n<main>\n<header>\n<h1>Linkbox</h1>\n<p>Welcome, {label}</p>\n<form method=\"post\" action=\"/auth/signout\"><button type=\"submit\">Sign out</button></form>\n</header>\n<form id=\"add-form\">\n<label for=\"url\">URL</label>\n<input id=\"url\" type=\"text\" placeholder=\"https://example.com\" />\n<label for=\"title\">Title (optional)</label>\n<input id=\"title\" type=\"text\" placeholder=\"Bookmark title\" />\n<p id=\"form-error\" class=\"error\"></p>\n<button type=\"submit\">Add Bookmark</button>\n</form>\n<h2>Your Bookmarks</h2>\n<section id=\"bookmarks\">\n{section}\n</section>\n</main>\n<script>\n{script}\n</script>\n</body>\n</html>\n",
        script = DASHBOARD_SCRIPT,
    )
}

/// List fragment shared by the initial render and the SSE feed; the feed
/// replaces the `#bookmarks` element with exactly this markup. Renders the
/// sync component's full state: loading placeholder, error, or the list.
pub(crate) fn render_bookmark_section(
    items: &[Bookmark],
    error: Option<&str>,
    loading: bool,
) -> String {
    if loading {
        return "<p>Loading bookmarks...</p>".to_string();
    }
    if let Some(message) = error {
        return format!("<p class=\"error\">{}</p>", encode_minimal(message));
    }
    if items.is_empty() {
        return "<p>No bookmarks yet. Add one above to get started!</p>".to_string();
    }
    let mut out = String::from("<ul>\n");
    for item in items {
        let url = encode_attribute(&item.url);
        let url_text = encode_minimal(&item.url);
        let title = encode_minimal(&item.title);
        let created = item.created_at.format("%Y-%m-%d %H:%M");
        out.push_str(&format!(
            "<li>\n<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{title}</a>\n<small>{url_text}</small>\n<time>{created}</time>\n<button data-id=\"{id}\">Delete</button>\n</li>\n",
            id = item.id,
        ));
    }
    out.push_str("</ul>\n");
    out
}

// Kept to a handful of lines on purpose: the browser only submits edits and
// swaps in list markup the server already rendered.
const DASHBOARD_SCRIPT: &str = r#"document.getElementById('add-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const url = document.getElementById('url').value;
  const title = document.getElementById('title').value;
  const res = await fetch('/api/bookmarks', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ url, title }),
  });
  const errBox = document.getElementById('form-error');
  if (res.ok) {
    e.target.reset();
    errBox.textContent = '';
  } else {
    const body = await res.json().catch(() => null);
    errBox.textContent = (body && body.error) || 'Failed to add bookmark';
  }
});
document.getElementById('bookmarks').addEventListener('click', async (e) => {
  const btn = e.target.closest('button[data-id]');
  if (!btn) return;
  if (!confirm('Are you sure you want to delete this bookmark?')) return;
  const res = await fetch('/api/bookmarks/' + btn.dataset.id, { method: 'DELETE' });
  if (!res.ok) alert('Failed to delete bookmark');
});
const es = new EventSource('/api/bookmarks/updates');
es.addEventListener('bookmarks', (e) => {
  document.getElementById('bookmarks').innerHTML = e.data;
});"#;
