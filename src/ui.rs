use crate::models::{Activity, ActivitySummary, Reply, Viewer};

pub fn render_index(viewer: &Viewer, query: &str, activities: &[ActivitySummary]) -> String {
    let items = if activities.is_empty() && viewer.keyword().is_some() {
        r#"<p class="hint">No activities match that keyword.</p>"#.to_string()
    } else if activities.is_empty() {
        r#"<p class="hint">No activities yet. Create the first one above.</p>"#.to_string()
    } else {
        activities
            .iter()
            .map(|activity| render_card(activity, query))
            .collect::<Vec<_>>()
            .join("\n")
    };

    INDEX_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{USERNAME}}", &escape_html(viewer.username.as_deref().unwrap_or("")))
        .replace("{{HANDLE}}", &escape_html(viewer.handle().unwrap_or("")))
        .replace("{{KEYWORD}}", &escape_html(viewer.keyword().unwrap_or("")))
        .replace("{{ACTIVITIES}}", &items)
}

fn render_card(activity: &ActivitySummary, query: &str) -> String {
    let href = if query.is_empty() {
        format!("/activities/{}", activity.id)
    } else {
        format!("/activities/{}?{}", activity.id, query)
    };
    format!(
        r#"<a class="card" href="{href}">
  <span class="card-title">{title}</span>
  <span class="card-meta">{username} @{handle} · {begin} → {end}</span>
  <span class="card-members">{members} joined</span>
</a>"#,
        href = escape_html(&href),
        title = escape_html(&activity.title),
        username = escape_html(&activity.username),
        handle = escape_html(&activity.handle),
        begin = escape_html(&activity.begintime),
        end = escape_html(&activity.endtime),
        members = activity.members,
    )
}

pub fn render_activity(
    activity: &Activity,
    viewer: &Viewer,
    members: i64,
    joined: bool,
    replies: &[Reply],
) -> String {
    let config = serde_json::json!({
        "activityId": activity.id,
        "handle": viewer.handle(),
        "username": viewer.username,
        "joined": joined,
    });

    ACTIVITY_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TITLE}}", &escape_html(&activity.title))
        .replace("{{OWNER}}", &escape_html(&activity.username))
        .replace("{{OWNER_HANDLE}}", &escape_html(&activity.handle))
        .replace("{{BEGIN}}", &escape_html(&activity.begintime))
        .replace("{{END}}", &escape_html(&activity.endtime))
        .replace("{{MEMBERS}}", &members.to_string())
        .replace("{{REPLIES}}", &render_replies(replies))
        .replace("{{CONFIG}}", &script_json(&config))
}

fn render_replies(replies: &[Reply]) -> String {
    if replies.is_empty() {
        return r#"<p class="hint">No replies yet.</p>"#.to_string();
    }
    replies
        .iter()
        .map(|reply| {
            format!(
                r#"<article class="reply">
  <p class="reply-meta"><strong>{username}</strong> @{handle} · {created_at}</p>
  <p class="reply-body">{content}</p>
</article>"#,
                username = escape_html(&reply.username),
                handle = escape_html(&reply.handle),
                created_at = escape_html(&reply.created_at),
                content = escape_html(&reply.content),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON that is safe to drop inside a `<script>` element.
fn script_json(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

const STYLE: &str = r#"
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ffbd00;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      margin: 0;
    }

    h2 {
      margin: 0;
      font-size: 1.2rem;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.95rem;
    }

    form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 12px;
      align-items: end;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      color: #8b857d;
      text-transform: uppercase;
      letter-spacing: 0.08em;
    }

    input {
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 12px;
      padding: 10px 12px;
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }

    button:disabled {
      opacity: 0.6;
      cursor: wait;
    }

    .card {
      display: grid;
      gap: 4px;
      padding: 16px 18px;
      border-radius: 18px;
      background: white;
      border: 1px solid rgba(47, 72, 88, 0.08);
      color: inherit;
      text-decoration: none;
    }

    .card-title {
      font-weight: 600;
      font-size: 1.1rem;
    }

    .card-meta,
    .card-members {
      color: #6f6a65;
      font-size: 0.9rem;
    }

    .list {
      display: grid;
      gap: 12px;
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    .grid-wrap {
      overflow-x: auto;
      background: white;
      border-radius: 20px;
      padding: 12px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    table {
      border-collapse: collapse;
      width: 100%;
    }

    th {
      font-weight: 500;
      font-size: 0.85rem;
      color: #6b645d;
      padding: 6px 8px;
      white-space: nowrap;
    }

    td.slot {
      border: 1px solid #d6d3d1;
      height: 28px;
      min-width: 64px;
      cursor: pointer;
    }

    td.slot:hover {
      box-shadow: inset 0 0 0 2px rgba(255, 189, 0, 0.6);
    }

    td.slot.closed {
      background-color: #78716c !important;
      cursor: not-allowed;
    }

    td.slot.locked {
      cursor: default;
    }

    td.slot.mine {
      outline: 3px solid #dc2626;
      outline-offset: -3px;
    }

    textarea {
      width: 100%;
      min-height: 72px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 12px;
      padding: 10px 12px;
      font: inherit;
      resize: vertical;
    }

    .replies {
      display: grid;
      gap: 10px;
    }

    .reply {
      padding: 12px 16px;
      border-radius: 16px;
      background: white;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .reply-meta {
      margin: 0 0 4px;
      color: #6f6a65;
      font-size: 0.9rem;
    }

    .reply-body {
      margin: 0;
      white-space: pre-wrap;
      word-break: break-word;
    }

    .legend td {
      height: 28px;
      border: 1px solid #d6d3d1;
    }

    .legend td.label {
      border: none;
      font-size: 0.85rem;
      color: #6b645d;
      padding: 0 10px;
      white-space: nowrap;
    }
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Activity Planner</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Activity Planner</h1>
      <p class="subtitle">Host an activity, let people join, and find the hours that work for everyone.</p>
    </header>

    <section>
      <h2>Who are you?</h2>
      <form id="identity-form" method="get" action="/">
        <label>Name <input name="username" value="{{USERNAME}}" maxlength="50" required /></label>
        <label>Handle <input name="handle" value="{{HANDLE}}" maxlength="50" required /></label>
        <button type="submit">Use this identity</button>
      </form>
    </section>

    <section>
      <h2>Search</h2>
      <form id="search-form" method="get" action="/">
        <input type="hidden" name="username" value="{{USERNAME}}" />
        <input type="hidden" name="handle" value="{{HANDLE}}" />
        <label>Title contains <input name="keyword" value="{{KEYWORD}}" maxlength="50" /></label>
        <button type="submit">Search</button>
      </form>
    </section>

    <section>
      <h2>New activity</h2>
      <form id="create-form">
        <label>Title <input id="title" maxlength="50" /></label>
        <label>From <input id="begin" type="datetime-local" step="3600" /></label>
        <label>To <input id="end" type="datetime-local" step="3600" /></label>
        <button id="create-btn" type="submit">Create</button>
      </form>
    </section>

    <div class="status" id="status"></div>

    <section class="list">
      {{ACTIVITIES}}
    </section>
  </main>

  <script>
    const params = new URLSearchParams(window.location.search);
    const statusEl = document.getElementById('status');
    const createForm = document.getElementById('create-form');
    const createBtn = document.getElementById('create-btn');
    const MAX_SPAN_MS = 7 * 24 * 60 * 60 * 1000;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    // datetime-local gives "yyyy-MM-ddTHH:mm"; the server wants "yyyy-MM-dd HH:mm:ss"
    const toTimestamp = (value) => {
      const [day, time] = value.split('T');
      const [hh, mm] = time.split(':');
      return `${day} ${hh}:${mm}:00`;
    };

    const send = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body)
      });
      if (!res.ok) {
        let message = '';
        try {
          message = (await res.json()).error;
        } catch (_) {
          message = '';
        }
        throw new Error(message || 'Request failed');
      }
      return res;
    };

    const validate = (title, begin, end) => {
      if (!params.get('handle') || !params.get('username')) {
        return 'Pick a name and handle first.';
      }
      if (!title || title.length > 50) {
        return 'Title must be between 1 and 50 characters long.';
      }
      if (!begin || !end) {
        return 'Both start and end are required.';
      }
      const span = new Date(end) - new Date(begin);
      if (!(span > 0) || span > MAX_SPAN_MS) {
        return 'Start must be before end, and an activity may not last more than seven days.';
      }
      return null;
    };

    createForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const title = document.getElementById('title').value.trim();
      const begin = document.getElementById('begin').value;
      const end = document.getElementById('end').value;
      const problem = validate(title, begin, end);
      if (problem) {
        setStatus(problem, 'error');
        return;
      }

      const handle = params.get('handle');
      createBtn.disabled = true;
      setStatus('Saving...', 'info');
      try {
        await send('POST', '/api/users', { handle, displayName: params.get('username') });
        const res = await send('POST', '/api/activities', {
          handle,
          title,
          begintime: toTimestamp(begin),
          endtime: toTimestamp(end)
        });
        const activity = await res.json();
        await send('POST', '/api/likes', { tweetId: activity.id, userHandle: handle });
        window.location.href = `/activities/${activity.id}?${params.toString()}`;
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        createBtn.disabled = false;
      }
    });
  </script>
</body>
</html>
"#;

const ACTIVITY_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <p class="hint"><a id="back" href="/">← All activities</a></p>
      <h1>{{TITLE}}</h1>
      <p class="subtitle">{{OWNER}} @{{OWNER_HANDLE}} · {{BEGIN}} → {{END}}</p>
    </header>

    <section>
      <p><span id="members">{{MEMBERS}}</span> joined</p>
      <button id="join-btn" type="button">Join</button>
      <p class="hint" id="join-hint"></p>
    </section>

    <div class="status" id="status"></div>

    <section class="grid-wrap">
      <table id="grid" aria-label="Availability"></table>
    </section>
    <table class="legend" id="legend"></table>

    <section class="replies">
      <h2>Replies</h2>
      <form id="reply-form" hidden>
        <textarea id="reply-content" maxlength="280" placeholder="Reply to @{{OWNER_HANDLE}}"></textarea>
        <button id="reply-btn" type="submit">Reply</button>
      </form>
      <p class="hint" id="reply-hint"></p>
      <div class="replies" id="reply-list">{{REPLIES}}</div>
    </section>
  </main>

  <script>
    const config = {{CONFIG}};
    const gridEl = document.getElementById('grid');
    const legendEl = document.getElementById('legend');
    const statusEl = document.getElementById('status');
    const membersEl = document.getElementById('members');
    const joinBtn = document.getElementById('join-btn');
    const joinHint = document.getElementById('join-hint');
    const replyForm = document.getElementById('reply-form');
    const replyContent = document.getElementById('reply-content');
    const replyBtn = document.getElementById('reply-btn');
    const replyHint = document.getElementById('reply-hint');
    const replyList = document.getElementById('reply-list');
    document.getElementById('back').href = `/${window.location.search}`;

    let view = null;
    let selected = new Set();
    let hovering = false;
    let inFlight = false;

    const key = (day, hour) => `${day}|${hour}`;
    const color = (intensity) => `rgba(255, 189, 0, ${intensity})`;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const send = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body)
      });
      if (!res.ok) {
        let message = '';
        try {
          message = (await res.json()).error;
        } catch (_) {
          message = '';
        }
        throw new Error(message || 'Request failed');
      }
    };

    const paintLegend = () => {
      const steps = view.heatmap.legend
        .map((step) => `<td style="background-color: ${color(step.intensity)}"></td>`)
        .join('');
      const scale = view.heatmap.scale;
      legendEl.innerHTML = `<tr><td class="label">0/${scale}</td>${steps}<td class="label">${scale}/${scale}</td></tr>`;
    };

    const paint = () => {
      if (!view) {
        return;
      }
      const canVote = view.can_vote && Boolean(config.handle);
      const head = view.heatmap.days.map((day) => `<th>${day}</th>`).join('');
      const body = view.heatmap.rows
        .map((row) => {
          const cells = row.cells
            .map((cell) => {
              const classes = ['slot'];
              if (!cell.selectable) {
                classes.push('closed');
              } else if (!canVote) {
                classes.push('locked');
              }
              if (hovering && canVote && selected.has(key(cell.day, cell.hour))) {
                classes.push('mine');
              }
              const bg = cell.count > 0 ? ` style="background-color: ${color(cell.intensity)}"` : '';
              const title = `${cell.day} ${row.label}: ${cell.count}`;
              return `<td class="${classes.join(' ')}"${bg} title="${title}" data-day="${cell.day}" data-hour="${cell.hour}" data-selectable="${cell.selectable}"></td>`;
            })
            .join('');
          return `<tr><th>${row.label}</th>${cells}</tr>`;
        })
        .join('');
      gridEl.innerHTML = `<tr><th></th>${head}</tr>${body}`;
    };

    const paintMembership = () => {
      joinBtn.textContent = config.joined ? 'Leave' : 'Join';
      joinBtn.disabled = !config.handle || inFlight;
      if (!config.handle) {
        joinHint.textContent = 'Pick a name and handle on the home page to join.';
      } else if (!config.joined) {
        joinHint.textContent = 'Join this activity to vote for the hours that work for you.';
      } else {
        joinHint.textContent = 'Click the hours that work for you. Click again to take it back.';
      }
      replyForm.hidden = !config.handle || !config.joined;
      replyBtn.disabled = inFlight;
      replyHint.textContent = config.handle && !config.joined ? 'Join this activity to join the discussion.' : '';
    };

    const paintReplies = (replies) => {
      replyList.replaceChildren();
      if (replies.length === 0) {
        const empty = document.createElement('p');
        empty.className = 'hint';
        empty.textContent = 'No replies yet.';
        replyList.append(empty);
        return;
      }
      for (const reply of replies) {
        const article = document.createElement('article');
        article.className = 'reply';
        const meta = document.createElement('p');
        meta.className = 'reply-meta';
        const name = document.createElement('strong');
        name.textContent = reply.username;
        meta.append(name, ` @${reply.handle} · ${reply.created_at}`);
        const body = document.createElement('p');
        body.className = 'reply-body';
        body.textContent = reply.content;
        article.append(meta, body);
        replyList.append(article);
      }
    };

    const loadReplies = async () => {
      const res = await fetch(`/api/activities/${config.activityId}/replies`);
      if (!res.ok) {
        throw new Error('Unable to load replies');
      }
      paintReplies(await res.json());
    };

    const postReply = async () => {
      const content = replyContent.value;
      if (!content.trim() || !config.handle || inFlight) {
        return;
      }
      inFlight = true;
      paintMembership();
      try {
        await send('POST', '/api/replies', {
          replyToTweetId: config.activityId,
          handle: config.handle,
          content
        });
        replyContent.value = '';
        await loadReplies();
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        inFlight = false;
        paintMembership();
      }
    };

    const loadTime = async () => {
      const query = new URLSearchParams({ tweetId: String(config.activityId) });
      if (config.handle) {
        query.set('handle', config.handle);
      }
      const res = await fetch(`/api/time?${query.toString()}`);
      if (!res.ok) {
        throw new Error('Unable to load availability');
      }
      view = await res.json();
      selected = new Set(view.selected.map((slot) => key(slot.day, slot.hour)));
      config.joined = view.can_vote;
      membersEl.textContent = view.member_count;
      paintMembership();
      paintLegend();
      paint();
    };

    const refresh = () => loadTime().catch((err) => setStatus(err.message, 'error'));

    const toggleCell = async (day, hour) => {
      if (!view || !view.can_vote || !config.handle || inFlight) {
        return;
      }
      const cellKey = key(day, hour);
      const currentlySelected = selected.has(cellKey);
      inFlight = true;
      if (currentlySelected) {
        selected.delete(cellKey);
      } else {
        selected.add(cellKey);
      }
      paint();
      setStatus('Saving...', 'info');
      try {
        await send(currentlySelected ? 'DELETE' : 'POST', '/api/time', {
          tweetId: config.activityId,
          userHandle: config.handle,
          day,
          hour
        });
        setStatus('Saved', 'ok');
        setTimeout(() => setStatus('', ''), 1200);
      } catch (err) {
        if (currentlySelected) {
          selected.add(cellKey);
        } else {
          selected.delete(cellKey);
        }
        paint();
        setStatus(err.message, 'error');
      } finally {
        inFlight = false;
        refresh();
      }
    };

    gridEl.addEventListener('click', (event) => {
      const cell = event.target.closest('td.slot');
      if (!cell || cell.dataset.selectable !== 'true') {
        return;
      }
      toggleCell(cell.dataset.day, Number(cell.dataset.hour));
    });

    gridEl.addEventListener('mouseenter', () => {
      hovering = true;
      paint();
    });

    gridEl.addEventListener('mouseleave', () => {
      hovering = false;
      paint();
    });

    replyForm.addEventListener('submit', (event) => {
      event.preventDefault();
      postReply();
    });

    replyContent.addEventListener('keydown', (event) => {
      if (event.key === 'Enter' && !event.shiftKey) {
        event.preventDefault();
        postReply();
      }
    });

    joinBtn.addEventListener('click', async () => {
      if (!config.handle || inFlight) {
        return;
      }
      inFlight = true;
      paintMembership();
      try {
        if (config.joined) {
          await send('DELETE', '/api/likes', { tweetId: config.activityId, userHandle: config.handle });
        } else {
          if (config.username) {
            await send('POST', '/api/users', { handle: config.handle, displayName: config.username });
          }
          await send('POST', '/api/likes', { tweetId: config.activityId, userHandle: config.handle });
        }
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        inFlight = false;
        refresh();
      }
    });

    paintMembership();
    refresh();
  </script>
</body>
</html>
"#;
