//! The single HTML page of the web UI.
//!
//! Self-contained (inline CSS and JS); everything dynamic comes from the
//! JSON API.

use axum::http::header;
use axum::response::IntoResponse;

pub async fn index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ragcrew</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7f9; color: #1d232b; }
  main { max-width: 860px; margin: 0 auto; padding: 24px; }
  section { background: #fff; border: 1px solid #dde1e6; border-radius: 6px; padding: 16px; margin-bottom: 16px; }
  h1 { font-size: 1.4rem; margin: 0 0 16px; }
  h2 { font-size: 1rem; margin: 0 0 12px; }
  input[type=text] { width: 100%; box-sizing: border-box; padding: 8px; border: 1px solid #c4cad1; border-radius: 4px; }
  button { margin-top: 8px; padding: 8px 14px; border: 0; border-radius: 4px; background: #2f5d8a; color: #fff; cursor: pointer; }
  button.secondary { background: #6b7580; }
  button:disabled { opacity: .5; cursor: default; }
  #status { font-size: .9rem; color: #4a545e; }
  .entry { border-top: 1px solid #eceff2; padding: 12px 0; }
  .entry:first-child { border-top: 0; }
  .query { font-weight: 600; }
  .answer { white-space: pre-wrap; margin: 6px 0; }
  .meta { font-size: .8rem; color: #6b7580; }
  .error .answer { color: #a12a2a; }
  .notes { font-size: .85rem; color: #8a5a00; margin: 4px 0; padding-left: 18px; }
  #metrics { font-size: .85rem; color: #4a545e; margin-top: 4px; }
</style>
</head>
<body>
<main>
  <h1>ragcrew</h1>

  <section>
    <h2>Corpus</h2>
    <div id="status">Loading status...</div>
    <div id="metrics"></div>
    <input type="text" id="corpus" placeholder="Path to a PDF, text file or directory (blank for the configured corpus)">
    <button id="init">Initialize pipeline</button>
  </section>

  <section>
    <h2>Ask</h2>
    <input type="text" id="question" placeholder="Ask a question about the document or anything on the web">
    <button id="ask">Ask</button>
  </section>

  <section>
    <h2>History</h2>
    <div id="history"></div>
    <button id="clear" class="secondary">Clear history</button>
  </section>
</main>
<script>
const $ = (id) => document.getElementById(id);

async function api(method, path, body) {
  const res = await fetch(path, {
    method,
    headers: body ? { "Content-Type": "application/json" } : {},
    body: body ? JSON.stringify(body) : undefined,
  });
  return res.json();
}

function text(tag, cls, value) {
  const el = document.createElement(tag);
  el.className = cls;
  el.textContent = value;
  return el;
}

async function refreshStatus() {
  const res = await api("GET", "/api/status");
  const s = res.data;
  $("status").textContent = s.initialized
    ? "Pipeline ready on " + s.corpus_path
    : "Pipeline not initialized";
  $("metrics").textContent = "Queries processed: " + s.history_len;
  $("ask").disabled = !s.initialized;
}

function notes(e) {
  const items = [];
  if (e.verdict === "ungrounded") items.push("The answer could not be fully grounded in the retrieved context.");
  for (const d of (e.degradations || [])) items.push(d.kind + ": " + d.message);
  if (!items.length) return null;
  const ul = document.createElement("ul");
  ul.className = "notes";
  for (const item of items) ul.appendChild(text("li", "", item));
  return ul;
}

async function refreshHistory() {
  const res = await api("GET", "/api/history");
  const list = $("history");
  list.replaceChildren();
  for (const e of (res.data || []).slice().reverse()) {
    const div = document.createElement("div");
    div.className = "entry" + (e.error_flag ? " error" : "");
    div.appendChild(text("div", "query", e.query));
    div.appendChild(text("div", "answer", e.answer));
    const caveats = notes(e);
    if (caveats) div.appendChild(caveats);
    const when = new Date(e.timestamp).toLocaleTimeString();
    const route = e.route ? " | " + e.route : "";
    const kind = e.error_kind ? " | " + e.error_kind : "";
    const verdict = e.verdict ? " | " + e.verdict : "";
    div.appendChild(text("div", "meta", when + " | " + e.processing_time.toFixed(2) + "s" + route + verdict + kind));
    list.appendChild(div);
  }
}

$("init").onclick = async () => {
  $("init").disabled = true;
  $("status").textContent = "Initializing...";
  const res = await api("POST", "/api/initialize", { corpus_path: $("corpus").value || null });
  $("init").disabled = false;
  if (!res.ok) { $("status").textContent = res.error; return; }
  await refreshStatus();
};

$("ask").onclick = async () => {
  const question = $("question").value.trim();
  if (!question) return;
  $("ask").disabled = true;
  $("ask").textContent = "Thinking...";
  const res = await api("POST", "/api/ask", { question });
  $("ask").disabled = false;
  $("ask").textContent = "Ask";
  if (!res.ok) { alert(res.error); return; }
  $("question").value = "";
  await refreshHistory();
  await refreshStatus();
};

$("question").addEventListener("keydown", (ev) => { if (ev.key === "Enter") $("ask").click(); });

$("clear").onclick = async () => {
  await api("POST", "/api/history/clear");
  await refreshHistory();
  await refreshStatus();
};

refreshStatus();
refreshHistory();
</script>
</body>
</html>
"#;
