use crate::models::DashboardResponse;

pub fn render_index(dashboard: &DashboardResponse) -> String {
    let summary = &dashboard.summary;
    let weight = summary
        .latest_weight
        .map(|kg| format!("{kg} kg"))
        .unwrap_or_else(|| "No data".to_string());

    INDEX_HTML
        .replace("{{DATE}}", &dashboard.date)
        .replace("{{WINDOW}}", &dashboard.window)
        .replace("{{CALORIES_IN}}", &summary.calories_consumed.to_string())
        .replace("{{CALORIES_OUT}}", &summary.calories_burned.to_string())
        .replace("{{WORKOUTS}}", &summary.workout_count.to_string())
        .replace("{{WEIGHT}}", &escape_html(&weight))
        .replace("{{MOTIVATION}}", &escape_html(&dashboard.motivation))
}

/// Motivation text comes from any `MotivationGenerator` implementation and
/// may contain markup characters.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>CalTrack</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --paper: #f4f1ea;
      --ink: #1f2a2e;
      --muted: #6b7478;
      --calories: #e8663d;
      --burn: #2c7a7b;
      --weight: #7b5ea7;
      --card: rgba(255, 255, 255, 0.9);
      --line: rgba(31, 42, 46, 0.1);
      --shadow: 0 18px 48px rgba(31, 42, 46, 0.14);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--paper), #e6efe9 70%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 28px 16px 48px;
    }

    .shell {
      width: min(1080px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header h1 {
      font-family: "Fraunces", Georgia, serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    header p { margin: 4px 0 0; color: var(--muted); }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 20px;
    }

    .summary {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .metric .label {
      display: block;
      font-size: 0.8rem;
      letter-spacing: 0.1em;
      text-transform: uppercase;
      color: var(--muted);
    }

    .metric .value {
      display: block;
      margin-top: 6px;
      font-size: 1.9rem;
      font-weight: 600;
    }

    .metric.calories .value { color: var(--calories); }
    .metric.burn .value { color: var(--burn); }
    .metric.weight .value { color: var(--weight); }

    .motivation {
      font-size: 1.05rem;
      font-weight: 500;
      border-left: 4px solid var(--burn);
    }

    .forms {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 16px;
    }

    form { display: grid; gap: 10px; }
    form h2 { margin: 0 0 4px; font-size: 1.1rem; }

    label { display: grid; gap: 4px; font-size: 0.85rem; color: var(--muted); }

    input {
      font: inherit;
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid var(--line);
      background: white;
      color: var(--ink);
    }

    button {
      font: inherit;
      font-weight: 600;
      border: none;
      border-radius: 999px;
      padding: 12px 16px;
      cursor: pointer;
      color: white;
      background: var(--burn);
    }

    button[disabled] { opacity: 0.6; cursor: progress; }
    #meal-form button { background: var(--calories); }
    #weight-form button { background: var(--weight); }

    .charts-header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    .charts-header h2 { margin: 0; }

    .windows {
      display: flex;
      gap: 6px;
      padding: 5px;
      border-radius: 999px;
      background: var(--line);
    }

    .windows button {
      background: transparent;
      color: var(--muted);
      padding: 7px 14px;
    }

    .windows button.active { background: white; color: var(--ink); }

    .charts {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
      gap: 16px;
    }

    .charts h3 { margin: 0 0 8px; font-size: 1rem; }

    svg.chart { width: 100%; height: 240px; display: block; }
    svg.chart text { font-family: inherit; }

    .grid-line { stroke: var(--line); }
    .axis-label { fill: var(--muted); font-size: 11px; }
    .series { fill: none; stroke-width: 3; }
    .bar { opacity: 0.8; }

    .legend { display: flex; gap: 14px; font-size: 0.85rem; color: var(--muted); }
    .legend span::before {
      content: '';
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
      background: var(--swatch);
    }

    .status { min-height: 1.2em; color: var(--muted); }
    .status[data-type="error"] { color: #b83227; }
    .status[data-type="ok"] { color: #2d7a4b; }

    @media (max-width: 600px) {
      .charts { grid-template-columns: 1fr; }
    }
  </style>
</head>
<body>
  <main class="shell">
    <header>
      <h1>CalTrack</h1>
      <p>Today is <span id="date">{{DATE}}</span>. Log workouts, meals and weigh-ins, then watch the trends.</p>
    </header>

    <section class="summary">
      <div class="card metric calories">
        <span class="label">Calories in</span>
        <span class="value" id="calories-in">{{CALORIES_IN}}</span>
      </div>
      <div class="card metric burn">
        <span class="label">Calories burned</span>
        <span class="value" id="calories-out">{{CALORIES_OUT}}</span>
      </div>
      <div class="card metric">
        <span class="label">Workouts today</span>
        <span class="value" id="workouts">{{WORKOUTS}}</span>
      </div>
      <div class="card metric weight">
        <span class="label">Current weight</span>
        <span class="value" id="weight">{{WEIGHT}}</span>
      </div>
    </section>

    <p class="card motivation" id="motivation">{{MOTIVATION}}</p>

    <section class="forms">
      <form class="card" id="workout-form" data-endpoint="/api/workouts" data-kind="Workout">
        <h2>Log workout</h2>
        <label>Exercise<input name="exercise_name" required placeholder="Running" /></label>
        <label>Duration (minutes)<input name="duration" type="number" min="1" required placeholder="30" /></label>
        <label>Calories burned<input name="calories" type="number" min="1" required placeholder="200" /></label>
        <button type="submit">Log workout</button>
      </form>
      <form class="card" id="meal-form" data-endpoint="/api/meals" data-kind="Meal">
        <h2>Log meal</h2>
        <label>Meal<input name="meal_name" required placeholder="Oatmeal" /></label>
        <label>Calories<input name="calories" type="number" min="1" required placeholder="350" /></label>
        <button type="submit">Log meal</button>
      </form>
      <form class="card" id="weight-form" data-endpoint="/api/weights" data-kind="Weight">
        <h2>Track weight</h2>
        <label>Weight (kg)<input name="weight" type="number" min="1" step="0.1" required placeholder="70.5" /></label>
        <button type="submit">Log weight</button>
      </form>
    </section>

    <div class="status" id="status"></div>

    <section class="card">
      <div class="charts-header">
        <h2>Trends</h2>
        <div class="windows" role="tablist">
          <button type="button" data-window="7">7 days</button>
          <button type="button" data-window="30">30 days</button>
          <button type="button" data-window="all">All time</button>
        </div>
      </div>
    </section>

    <section class="charts">
      <div class="card">
        <h3>Calories in vs out</h3>
        <div class="legend">
          <span style="--swatch: var(--calories)">In</span>
          <span style="--swatch: var(--burn)">Burned</span>
        </div>
        <svg class="chart" id="calories-chart" viewBox="0 0 600 240" role="img" aria-label="Calories chart"></svg>
      </div>
      <div class="card">
        <h3>Workout activity</h3>
        <svg class="chart" id="workouts-chart" viewBox="0 0 600 240" role="img" aria-label="Workouts chart"></svg>
      </div>
      <div class="card">
        <h3>Weight trend</h3>
        <svg class="chart" id="weight-chart" viewBox="0 0 600 240" role="img" aria-label="Weight chart"></svg>
      </div>
      <div class="card">
        <h3>Weekly totals</h3>
        <div class="legend">
          <span style="--swatch: var(--calories)">In</span>
          <span style="--swatch: var(--burn)">Burned</span>
        </div>
        <svg class="chart" id="weekly-chart" viewBox="0 0 600 240" role="img" aria-label="Weekly chart"></svg>
      </div>
    </section>
  </main>

  <script>
    const byId = (id) => document.getElementById(id);
    const statusEl = byId('status');
    const windowButtons = Array.from(document.querySelectorAll('.windows button'));

    let activeWindow = '{{WINDOW}}';
    let revision = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const WIDTH = 600;
    const HEIGHT = 240;
    const PAD_X = 44;
    const PAD_BOTTOM = 32;
    const PAD_TOP = 16;

    const axisValue = (value) => {
      const rounded = Math.round(value * 10) / 10;
      return Number.isInteger(rounded) ? rounded.toString() : rounded.toFixed(1);
    };

    const scale = (values, fromZero) => {
      let min = Math.min(...values);
      let max = Math.max(...values);
      if (fromZero) {
        min = Math.min(min, 0);
      } else {
        min -= 1;
        max += 1;
      }
      if (min === max) {
        max += 1;
      }
      const plotHeight = HEIGHT - PAD_TOP - PAD_BOTTOM;
      return {
        min,
        max,
        y: (value) => HEIGHT - PAD_BOTTOM - ((value - min) / (max - min)) * plotHeight
      };
    };

    const frame = (labels, yScale) => {
      let svg = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = yScale.min + ((yScale.max - yScale.min) * i) / 4;
        const y = yScale.y(value);
        svg += `<line class="grid-line" x1="${PAD_X}" y1="${y}" x2="${WIDTH - PAD_X}" y2="${y}" />`;
        svg += `<text class="axis-label" x="${PAD_X - 8}" y="${y + 4}" text-anchor="end">${axisValue(value)}</text>`;
      }
      const step = Math.ceil(labels.length / 8);
      labels.forEach((label, index) => {
        if (index % step !== 0) {
          return;
        }
        svg += `<text class="axis-label" x="${xAt(index, labels.length)}" y="${HEIGHT - PAD_BOTTOM + 18}" text-anchor="middle">${label}</text>`;
      });
      return svg;
    };

    const xAt = (index, count) => {
      if (count <= 1) {
        return WIDTH / 2;
      }
      return PAD_X + (index * (WIDTH - PAD_X * 2)) / (count - 1);
    };

    const empty = (el) => {
      el.innerHTML = '<text class="axis-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
    };

    const renderLines = (el, labels, series, fromZero = true) => {
      if (!labels.length) {
        empty(el);
        return;
      }
      const yScale = scale(series.flatMap((s) => s.values), fromZero);
      let svg = frame(labels, yScale);
      series.forEach(({ values, color }) => {
        const path = values
          .map((value, index) => `${index === 0 ? 'M' : 'L'} ${xAt(index, values.length).toFixed(2)} ${yScale.y(value).toFixed(2)}`)
          .join(' ');
        svg += `<path class="series" stroke="${color}" d="${path}" />`;
        values.forEach((value, index) => {
          svg += `<circle cx="${xAt(index, values.length)}" cy="${yScale.y(value)}" r="3.5" fill="white" stroke="${color}" stroke-width="2" />`;
        });
      });
      el.innerHTML = svg;
    };

    const renderBars = (el, labels, values, color) => {
      if (!labels.length) {
        empty(el);
        return;
      }
      const yScale = scale(values, true);
      const slot = (WIDTH - PAD_X * 2) / Math.max(labels.length, 1);
      const barWidth = Math.max(Math.min(slot * 0.6, 36), 2);
      let svg = frame(labels, yScale);
      values.forEach((value, index) => {
        const x = xAt(index, labels.length) - barWidth / 2;
        const y = yScale.y(value);
        svg += `<rect class="bar" x="${x}" y="${y}" width="${barWidth}" height="${yScale.y(0) - y}" rx="4" fill="${color}" />`;
      });
      el.innerHTML = svg;
    };

    const css = (name) => getComputedStyle(document.documentElement).getPropertyValue(name).trim();

    const renderDashboard = (data) => {
      const summary = data.summary;
      byId('date').textContent = data.date;
      byId('calories-in').textContent = summary.caloriesConsumed;
      byId('calories-out').textContent = summary.caloriesBurned;
      byId('workouts').textContent = summary.workoutCount;
      byId('weight').textContent = summary.latestWeight === null ? 'No data' : `${summary.latestWeight} kg`;
      byId('motivation').textContent = data.motivation;

      renderLines(
        byId('calories-chart'),
        data.caloriesChart.map((p) => p.date),
        [
          { values: data.caloriesChart.map((p) => p.caloriesIn), color: css('--calories') },
          { values: data.caloriesChart.map((p) => p.caloriesOut), color: css('--burn') }
        ]
      );
      renderBars(
        byId('workouts-chart'),
        data.workoutsChart.map((p) => p.date),
        data.workoutsChart.map((p) => p.workoutCount),
        css('--burn')
      );
      renderLines(
        byId('weight-chart'),
        data.weightChart.map((p) => p.date),
        [{ values: data.weightChart.map((p) => p.weight), color: css('--weight') }],
        false
      );
      renderLines(
        byId('weekly-chart'),
        data.weeklyTotals.map((w) => w.week.slice(5)),
        [
          { values: data.weeklyTotals.map((w) => w.caloriesIn), color: css('--calories') },
          { values: data.weeklyTotals.map((w) => w.caloriesOut), color: css('--burn') }
        ]
      );
    };

    const loadDashboard = async () => {
      const res = await fetch(`/api/dashboard?window=${encodeURIComponent(activeWindow)}`);
      if (!res.ok) {
        throw new Error((await res.text()) || 'Unable to load dashboard');
      }
      renderDashboard(await res.json());
    };

    const setWindow = (value) => {
      activeWindow = value;
      windowButtons.forEach((button) => {
        const active = button.dataset.window === value;
        button.classList.toggle('active', active);
        button.setAttribute('aria-selected', String(active));
      });
      loadDashboard().catch((err) => setStatus(err.message, 'error'));
    };

    const formPayload = (form) => {
      const payload = {};
      new FormData(form).forEach((value, key) => {
        payload[key] = value;
      });
      return payload;
    };

    const submit = async (form) => {
      const button = form.querySelector('button');
      button.disabled = true;
      setStatus('Saving...', 'info');
      try {
        const res = await fetch(form.dataset.endpoint, {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(formPayload(form))
        });
        if (!res.ok) {
          throw new Error((await res.text()) || 'Request failed');
        }
        form.reset();
        setStatus(`${form.dataset.kind} logged`, 'ok');
        setTimeout(() => setStatus('', ''), 1500);
      } catch (err) {
        setStatus(`Failed to log ${form.dataset.kind.toLowerCase()}: ${err.message}`, 'error');
      } finally {
        button.disabled = false;
      }
    };

    const watchChanges = async () => {
      for (;;) {
        try {
          const query = revision === null ? '' : `?since=${revision}`;
          const res = await fetch(`/api/changes${query}`);
          if (!res.ok) {
            throw new Error('change feed unavailable');
          }
          const event = await res.json();
          if (revision !== null && event.revision !== revision) {
            await loadDashboard();
          }
          revision = event.revision;
        } catch (err) {
          await new Promise((resolve) => setTimeout(resolve, 3000));
        }
      }
    };

    windowButtons.forEach((button) => {
      button.addEventListener('click', () => setWindow(button.dataset.window));
    });

    document.querySelectorAll('form').forEach((form) => {
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        submit(form);
      });
    });

    setWindow(activeWindow);
    watchChanges();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailySummary;

    fn dashboard(latest_weight: Option<f64>, motivation: &str) -> DashboardResponse {
        DashboardResponse {
            date: "2026-01-05".into(),
            window: "7".into(),
            summary: DailySummary {
                calories_consumed: 1800,
                calories_burned: 420,
                workout_count: 2,
                latest_weight,
            },
            calories_chart: Vec::new(),
            workouts_chart: Vec::new(),
            weight_chart: Vec::new(),
            weekly_totals: Vec::new(),
            motivation: motivation.into(),
        }
    }

    #[test]
    fn index_fills_summary() {
        let html = render_index(&dashboard(Some(70.5), "Keep going!"));
        assert!(html.contains(r#"id="calories-in">1800<"#));
        assert!(html.contains(r#"id="workouts">2<"#));
        assert!(html.contains("70.5 kg"));
        assert!(html.contains("let activeWindow = '7';"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn index_shows_no_data_and_escapes_text() {
        let html = render_index(&dashboard(None, "<b>You're</b>"));
        assert!(html.contains(r#"id="weight">No data<"#));
        assert!(html.contains("&lt;b&gt;You&#39;re&lt;/b&gt;"));
    }
}
