use crate::models::ViewState;

pub fn render_index(view: &ViewState) -> String {
    INDEX_HTML
        .replace("{{NOW}}", &view.now)
        .replace("{{TOTAL}}", &view.stats.total.to_string())
        .replace("{{INCOMPLETE}}", &view.stats.incomplete.to_string())
        .replace("{{COMPLETED}}", &view.stats.completed.to_string())
        .replace(
            "{{PERCENT}}",
            &format!("{:.2}%", view.stats.completion_percentage),
        )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily To-do</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --ok: #2d7a4b;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .clock {
      margin: 4px 0 0;
      color: #5f5c57;
      font-variant-numeric: tabular-nums;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 14px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      display: block;
      font-size: 1.5rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    input[type="text"] {
      flex: 1 1 240px;
      padding: 12px 16px;
      border-radius: 999px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      font-size: 1rem;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      color: white;
      background: var(--accent-2);
    }

    button.primary {
      background: var(--accent);
    }

    button.quiet {
      background: rgba(47, 72, 88, 0.12);
      color: var(--accent-2);
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 10px;
    }

    li {
      background: white;
      border-radius: 16px;
      padding: 12px 16px;
      display: grid;
      gap: 8px;
    }

    li.done .text {
      text-decoration: line-through;
      color: #8b857d;
    }

    .meta {
      font-size: 0.85rem;
      color: #8b857d;
    }

    .status {
      min-height: 1.2em;
      color: #6b645d;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>To-do List</h1>
      <p class="clock" id="clock">{{NOW}}</p>
    </header>

    <section class="panel">
      <div class="stat"><span class="label">Total</span><span class="value" id="total">{{TOTAL}}</span></div>
      <div class="stat"><span class="label">Not done</span><span class="value" id="incomplete">{{INCOMPLETE}}</span></div>
      <div class="stat"><span class="label">Done</span><span class="value" id="completed">{{COMPLETED}}</span></div>
      <div class="stat"><span class="label">Progress</span><span class="value" id="percent">{{PERCENT}}</span></div>
    </section>
    <section class="panel" id="category-stats"></section>

    <section class="row">
      <input type="text" id="draft-text" placeholder="Add a new task" />
      <button class="primary" id="add-btn" type="button">Add</button>
      <button class="quiet" id="reset-btn" type="button">Reset list</button>
    </section>
    <section class="row" id="draft-categories"></section>
    <section class="row">
      <button id="snapshot-btn" type="button">Save daily progress</button>
    </section>

    <ul id="tasks"></ul>

    <section>
      <h2>Daily history</h2>
      <ul id="history"></ul>
      <p><button class="quiet" id="reset-history-btn" type="button">Reset all history</button></p>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const CATEGORIES = [
      ['responsibility', 'Responsibility'],
      ['leisure', 'Leisure'],
      ['creation', 'Creation'],
    ];
    const statusEl = document.getElementById('status');
    const draftText = document.getElementById('draft-text');
    let view = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const el = (tag, props = {}, children = []) => {
      const node = document.createElement(tag);
      Object.assign(node, props);
      children.forEach((child) => node.append(child));
      return node;
    };

    const call = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body),
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      render(await res.json());
    };

    const run = (promise) => promise.catch((err) => setStatus(err.message, 'error'));

    const categoryBox = (checked, onChange, label) =>
      el('label', {}, [el('input', { type: 'checkbox', checked, onchange: onChange }), ' ' + label]);

    const renderStats = (stats) => {
      document.getElementById('total').textContent = stats.total;
      document.getElementById('incomplete').textContent = stats.incomplete;
      document.getElementById('completed').textContent = stats.completed;
      document.getElementById('percent').textContent = stats.completion_percentage.toFixed(2) + '%';
      document.getElementById('category-stats').replaceChildren(
        ...stats.categories.map((stat) =>
          el('div', { className: 'stat' }, [
            el('span', { className: 'label', textContent: stat.label }),
            el('span', {
              className: 'value',
              textContent: `${stat.completed_count} (${stat.percentage.toFixed(2)}%)`,
            }),
          ])
        )
      );
    };

    const renderTask = (task) => {
      const editing = view.editing && view.editing.task_id === task.id;
      const children = [];
      if (editing) {
        const input = el('input', {
          type: 'text',
          value: view.editing.buffer,
          onchange: (e) => run(call('PUT', '/api/edit', { text: e.target.value })),
        });
        children.push(
          el('div', { className: 'row' }, [
            input,
            el('button', {
              className: 'primary',
              textContent: 'Save',
              onclick: () =>
                run(call('PUT', '/api/edit', { text: input.value }).then(() =>
                  call('POST', `/api/tasks/${task.id}/save`)
                )),
            }),
            el('button', {
              className: 'quiet',
              textContent: 'Cancel',
              onclick: () => run(call('POST', '/api/edit/cancel')),
            }),
          ])
        );
      } else {
        children.push(el('span', { className: 'text', textContent: task.text }));
      }

      const meta = `Created ${task.date}` + (task.completionDate ? ` · done ${task.completionDate}` : '');
      children.push(el('span', { className: 'meta', textContent: meta }));

      const actions = [
        el('button', {
          textContent: task.completed ? 'Undo' : 'Done',
          onclick: () => run(call('POST', `/api/tasks/${task.id}/toggle`)),
        }),
      ];
      if (!task.completed && !editing) {
        actions.push(
          el('button', {
            className: 'quiet',
            textContent: 'Edit',
            onclick: () => run(call('POST', `/api/tasks/${task.id}/edit`)),
          })
        );
      }
      actions.push(
        el('button', {
          className: 'quiet',
          textContent: 'Remove',
          onclick: () => run(call('DELETE', `/api/tasks/${task.id}`)),
        })
      );
      CATEGORIES.forEach(([key, label]) =>
        actions.push(
          categoryBox(
            task.types[key],
            (e) => run(call('POST', `/api/tasks/${task.id}/category`, { category: key, value: e.target.checked })),
            label
          )
        )
      );
      children.push(el('div', { className: 'row' }, actions));

      return el('li', { className: task.completed ? 'done' : '' }, children);
    };

    const renderHistory = (rows) => {
      const list = document.getElementById('history');
      if (!rows.length) {
        list.replaceChildren(el('li', { textContent: 'No history yet' }));
        return;
      }
      list.replaceChildren(
        ...rows.map((row) =>
          el('li', {}, [
            el('span', {
              textContent:
                `${row.date}: ${row.completed_tasks} of ${row.total_tasks} done` +
                (row.total_tasks ? ` (${row.completion_percentage.toFixed(2)}%)` : ''),
            }),
            ...row.categories.map((category) =>
              el('span', {
                className: 'meta',
                textContent: `${category.label}: ${category.live_completed_count} done now, ${category.percentage.toFixed(2)}% that day`,
              })
            ),
            el('button', {
              className: 'quiet',
              textContent: 'Delete',
              onclick: () => run(call('POST', '/api/history/remove', { date: row.date })),
            }),
          ])
        )
      );
    };

    const render = (next) => {
      view = next;
      document.getElementById('clock').textContent = view.now;
      renderStats(view.stats);
      if (document.activeElement !== draftText) {
        draftText.value = view.draft.text;
      }
      document.getElementById('draft-categories').replaceChildren(
        ...CATEGORIES.map(([key, label]) =>
          categoryBox(
            view.draft.categories[key],
            (e) => run(call('PUT', '/api/draft', { category: key, value: e.target.checked })),
            label
          )
        )
      );
      document.getElementById('tasks').replaceChildren(...view.tasks.map(renderTask));
      renderHistory(view.history);
      if (view.persistence_error) {
        setStatus(view.persistence_error, 'error');
      } else if (statusEl.dataset.type === 'error') {
        setStatus('', '');
      }
    };

    draftText.addEventListener('change', () => run(call('PUT', '/api/draft', { text: draftText.value })));
    document.getElementById('add-btn').addEventListener('click', () =>
      run(call('POST', '/api/tasks', { text: draftText.value }))
    );
    draftText.addEventListener('keydown', (e) => {
      if (e.key === 'Enter') {
        run(call('POST', '/api/tasks', { text: draftText.value }));
      }
    });
    document.getElementById('reset-btn').addEventListener('click', () => run(call('POST', '/api/tasks/reset')));
    document.getElementById('snapshot-btn').addEventListener('click', () =>
      run(call('POST', '/api/history/snapshot'))
    );
    document.getElementById('reset-history-btn').addEventListener('click', () =>
      run(call('POST', '/api/history/reset'))
    );

    const tick = async () => {
      const res = await fetch('/api/clock');
      if (res.ok) {
        document.getElementById('clock').textContent = (await res.json()).now;
      }
    };
    const clockTimer = setInterval(() => tick().catch(() => {}), 1000);
    window.addEventListener('pagehide', () => clearInterval(clockTimer));

    run(fetch('/api/state').then((res) => res.json()).then(render));
  </script>
</body>
</html>
"#;
