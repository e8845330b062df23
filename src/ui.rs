pub fn render_login() -> String {
    page("Energy Tracker | Sign in", LOGIN_BODY)
}

pub fn render_register() -> String {
    page("Energy Tracker | Register", REGISTER_BODY)
}

pub fn render_solar_forecast() -> String {
    page("Energy Tracker | Solar forecast", FORECAST_BODY)
}

pub fn render_dashboard(username: &str) -> String {
    page(
        "Energy Tracker | Dashboard",
        &DASHBOARD_BODY.replace("{{USERNAME}}", &escape_html(username)),
    )
}

// Body goes in last so user-supplied text is never rescanned for placeholders.
fn page(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", title)
        .replace("{{STYLE}}", STYLE)
        .replace("{{SCRIPT}}", SCRIPT)
        .replace("{{BODY}}", body)
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
            _ => out.push(ch),
        }
    }
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>{{STYLE}}</style>
</head>
<body>
{{BODY}}
  <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
  <script>{{SCRIPT}}</script>
</body>
</html>
"#;

const STYLE: &str = r#"
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f7ec;
      --bg-2: #fbe3a1;
      --ink: #22302a;
      --solar: #f39c12;
      --grid: #2980b9;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(34, 48, 42, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #fff6dc 60%, #eef5f0 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(980px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    .app.narrow {
      width: min(440px, 100%);
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: baseline;
      justify-content: space-between;
      gap: 6px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.6rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.25rem;
    }

    .subtitle {
      margin: 0;
      color: #5f655f;
    }

    form,
    .card {
      display: grid;
      gap: 12px;
    }

    .card {
      background: white;
      border-radius: 20px;
      padding: 18px;
      border: 1px solid rgba(34, 48, 42, 0.08);
    }

    .row {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #7d827c;
    }

    input {
      border: 1px solid rgba(34, 48, 42, 0.2);
      border-radius: 12px;
      padding: 12px 14px;
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--grid);
      color: white;
    }

    button.solar {
      background: var(--solar);
    }

    button.ghost {
      background: rgba(34, 48, 42, 0.08);
      color: var(--ink);
    }

    .btn-danger {
      background: var(--danger);
      padding: 6px 12px;
      font-size: 0.85rem;
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      align-items: end;
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      text-align: left;
      padding: 8px 6px;
      border-bottom: 1px solid rgba(34, 48, 42, 0.08);
    }

    ul {
      margin: 0;
      padding-left: 20px;
      display: grid;
      gap: 6px;
    }

    .text-danger {
      color: var(--danger);
    }

    a {
      color: var(--grid);
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
    }
"#;

const LOGIN_BODY: &str = r#"  <main class="app narrow">
    <header>
      <h1>Energy Tracker</h1>
      <p class="subtitle">Log solar and grid usage, see where the power goes.</p>
    </header>
    <form id="login-form">
      <label for="login-username">Username</label>
      <input id="login-username" autocomplete="username" />
      <label for="login-password">Password</label>
      <input id="login-password" type="password" autocomplete="current-password" />
      <button type="submit">Sign in</button>
    </form>
    <p class="subtitle">No account yet? <a href="/register">Register</a></p>
  </main>"#;

const REGISTER_BODY: &str = r#"  <main class="app narrow">
    <header>
      <h1>Create account</h1>
    </header>
    <form id="register-form">
      <label for="register-username">Username</label>
      <input id="register-username" autocomplete="username" />
      <label for="register-password">Password</label>
      <input id="register-password" type="password" autocomplete="new-password" />
      <button type="submit">Register</button>
    </form>
    <p class="subtitle">Already registered? <a href="/">Sign in</a></p>
  </main>"#;

const DASHBOARD_BODY: &str = r#"  <main class="app">
    <header>
      <h1>Welcome, {{USERNAME}}</h1>
      <a href="/solar_forecast">Solar forecast</a>
      <button id="logout" class="ghost" type="button">Log out</button>
    </header>

    <section class="card">
      <h2>Add reading</h2>
      <div class="row">
        <div class="card">
          <label for="solar-energy">Solar energy (kWh)</label>
          <input id="solar-energy" type="number" step="0.01" min="0" />
        </div>
        <div class="card">
          <label for="electric-energy">Grid energy (kWh)</label>
          <input id="electric-energy" type="number" step="0.01" min="0" />
        </div>
      </div>
      <button id="submit-energy" class="solar" type="button">Submit</button>
    </section>

    <section class="row">
      <div class="card stat">
        <label>Total solar (kWh)</label>
        <span id="total-solar" class="value">0.00</span>
      </div>
      <div class="card stat">
        <label>Total grid (kWh)</label>
        <span id="total-electric" class="value">0.00</span>
      </div>
      <div class="card stat">
        <label>Savings</label>
        <span id="savings-result" class="value">--</span>
      </div>
    </section>

    <section class="card">
      <h2>History</h2>
      <div class="filters">
        <button class="filter-btn ghost" type="button" data-range="all">All</button>
        <button class="filter-btn ghost" type="button" data-range="today">Today</button>
        <button class="filter-btn ghost" type="button" data-range="week">Week</button>
        <button class="filter-btn ghost" type="button" data-range="month">Month</button>
        <button class="filter-btn ghost" type="button" data-range="year">Year</button>
        <input id="start-date" type="date" aria-label="From date" />
        <input id="end-date" type="date" aria-label="To date" />
        <button id="filter-btn" type="button">Apply dates</button>
      </div>
      <canvas id="energyChart" height="120"></canvas>
      <table id="energy-table">
        <thead>
          <tr><th>Date</th><th>Solar (kWh)</th><th>Grid (kWh)</th><th></th></tr>
        </thead>
        <tbody></tbody>
      </table>
    </section>

    <section class="row">
      <div class="card">
        <h2>Analytics</h2>
        <p id="current-pattern">Loading...</p>
        <p id="next-hour-pred">Loading...</p>
        <p id="carbon-footprint">Loading...</p>
        <p id="energy-cost">Loading...</p>
      </div>
      <div class="card">
        <h2>Recommendations</h2>
        <ul id="recommendations"></ul>
      </div>
      <div class="card">
        <h2>Tips</h2>
        <ul id="energy-tips"></ul>
      </div>
    </section>
  </main>"#;

const FORECAST_BODY: &str = r#"  <main class="app">
    <header>
      <h1>Solar forecast</h1>
      <a href="/dashboard">Back to dashboard</a>
    </header>
    <section class="card">
      <form id="forecast-form" class="filters">
        <label for="forecast-lat">Latitude</label>
        <input id="forecast-lat" type="number" step="0.0001" min="-90" max="90" value="12.9716" />
        <label for="forecast-lon">Longitude</label>
        <input id="forecast-lon" type="number" step="0.0001" min="-180" max="180" value="77.5946" />
        <button type="submit">Show forecast</button>
      </form>
      <p id="forecast-status" class="subtitle"></p>
      <canvas id="forecastChart" height="120"></canvas>
    </section>
  </main>"#;

const SCRIPT: &str = r##"
document.addEventListener("DOMContentLoaded", function () {
  const API_BASE = window.location.origin;
  let currentRange = "all";
  let energyChart = null;
  let analyticsTimer = null;

  const postJson = (path, body) =>
    fetch(`${API_BASE}${path}`, {
      method: "POST",
      headers: { "Content-Type": "application/json", "Accept": "application/json" },
      credentials: "include",
      body: JSON.stringify(body),
    });

  const getJson = (path) =>
    fetch(`${API_BASE}${path}`, {
      method: "GET",
      credentials: "include",
      headers: { "Accept": "application/json" },
    });

  const readCredentials = (prefix) => ({
    username: document.getElementById(`${prefix}-username`).value.trim(),
    password: document.getElementById(`${prefix}-password`).value.trim(),
  });

  const registerForm = document.getElementById("register-form");
  if (registerForm) {
    registerForm.addEventListener("submit", async (event) => {
      event.preventDefault();
      const creds = readCredentials("register");
      if (!creds.username || !creds.password) {
        alert("Please enter both username and password.");
        return;
      }
      try {
        const response = await postJson("/register", creds);
        const data = await response.json();
        alert(data.message);
        if (response.ok && data.status === "success") {
          window.location.href = "/";
        }
      } catch (error) {
        alert("Registration failed. Try again later.");
      }
    });
  }

  const loginForm = document.getElementById("login-form");
  if (loginForm) {
    loginForm.addEventListener("submit", async (event) => {
      event.preventDefault();
      const creds = readCredentials("login");
      if (!creds.username || !creds.password) {
        alert("Please enter both username and password.");
        return;
      }
      try {
        const response = await postJson("/login", creds);
        const data = await response.json();
        if (response.ok && data.status === "success") {
          window.location.href = "/dashboard";
        } else {
          alert("Login failed: " + data.message);
        }
      } catch (error) {
        alert("Login failed. Try again later.");
      }
    });
  }

  const debounce = (fn, wait) => (...args) => {
    clearTimeout(analyticsTimer);
    analyticsTimer = setTimeout(() => fn(...args), wait);
  };

  const num = (value) => parseFloat(value) || 0;

  const submitEnergyBtn = document.getElementById("submit-energy");
  if (submitEnergyBtn) {
    submitEnergyBtn.addEventListener("click", async () => {
      const solar = parseFloat(document.getElementById("solar-energy").value);
      const electric = parseFloat(document.getElementById("electric-energy").value);
      if (isNaN(solar) || isNaN(electric)) {
        alert("Please enter valid numeric values for energy consumption.");
        return;
      }
      try {
        const response = await postJson("/add_energy", {
          date: new Date().toISOString().split("T")[0],
          solar_energy: solar,
          electric_energy: electric,
          temperature: 25,
          humidity: 60,
        });
        const data = await response.json();
        if (!response.ok || data.status !== "success") {
          console.error("Submit energy failed:", data);
          throw new Error(data.message || `Server error: ${response.status}`);
        }
        alert("Energy data submitted successfully!");
        document.getElementById("solar-energy").value = "";
        document.getElementById("electric-energy").value = "";
        await fetchEnergyData(currentRange);
        fetchEnergySavings();
        fetchEnergyTips();
      } catch (error) {
        console.error("Submit energy error:", error);
        alert(`Error: ${error.message}`);
      }
    });
  }

  async function fetchEnergyData(range = "all") {
    const fromDate = document.getElementById("start-date")?.value;
    const toDate = document.getElementById("end-date")?.value;

    let path = "/get_energy_data";
    if (range !== "all") {
      path += `?range=${encodeURIComponent(range)}`;
    } else if (fromDate && toDate) {
      path += `?from_date=${fromDate}&to_date=${toDate}`;
    }

    try {
      const response = await getJson(path);
      const result = await response.json();
      if (response.ok && result.status === "success") {
        updateEnergyTable(result.data);
        updateEnergyChart(result.data);
        updateTotals(result.data);
        debouncedFetchAnalytics();
      } else {
        console.error("Could not retrieve energy data:", result.message);
      }
    } catch (error) {
      console.error("Fetch error:", error);
    }
  }

  function updateEnergyTable(data) {
    const tbody = document.querySelector("#energy-table tbody");
    if (!tbody) return;

    tbody.innerHTML = "";
    data.forEach((entry) => {
      const row = document.createElement("tr");
      const cells = [entry.date || "N/A", num(entry.solar_energy).toFixed(2), num(entry.electric_energy).toFixed(2)];
      cells.forEach((text) => {
        const td = document.createElement("td");
        td.textContent = text;
        row.appendChild(td);
      });
      const action = document.createElement("td");
      const button = document.createElement("button");
      button.className = "btn-danger";
      button.type = "button";
      button.dataset.id = entry.id;
      button.textContent = "Delete";
      button.addEventListener("click", async () => {
        if (confirm(`Delete entry ID ${entry.id}?`)) {
          await deleteEntry(button.dataset.id);
        }
      });
      action.appendChild(button);
      row.appendChild(action);
      tbody.appendChild(row);
    });
  }

  function updateEnergyChart(data) {
    const canvas = document.getElementById("energyChart");
    if (!canvas || typeof Chart === "undefined") return;

    if (energyChart) {
      energyChart.destroy();
    }
    energyChart = new Chart(canvas.getContext("2d"), {
      type: "line",
      data: {
        labels: data.map((entry) => entry.date),
        datasets: [
          {
            label: "Solar Energy",
            backgroundColor: "rgba(243, 156, 18, 0.2)",
            borderColor: "#f39c12",
            data: data.map((entry) => num(entry.solar_energy)),
            fill: true,
            tension: 0.4,
          },
          {
            label: "Electric Energy",
            backgroundColor: "rgba(41, 128, 185, 0.2)",
            borderColor: "#2980b9",
            data: data.map((entry) => num(entry.electric_energy)),
            fill: true,
            tension: 0.4,
          },
        ],
      },
      options: {
        responsive: true,
        scales: {
          y: { beginAtZero: true, title: { display: true, text: "Energy (kWh)" } },
          x: { title: { display: true, text: "Date" } },
        },
        plugins: {
          legend: { position: "top" },
          title: { display: true, text: "Energy Consumption Over Time" },
        },
      },
    });
  }

  function updateTotals(data) {
    const totalSolar = data.reduce((sum, entry) => sum + num(entry.solar_energy), 0);
    const totalElectric = data.reduce((sum, entry) => sum + num(entry.electric_energy), 0);
    const solarEl = document.getElementById("total-solar");
    const electricEl = document.getElementById("total-electric");
    if (solarEl) solarEl.textContent = totalSolar.toFixed(2);
    if (electricEl) electricEl.textContent = totalElectric.toFixed(2);
  }

  async function deleteEntry(entryId) {
    try {
      const response = await postJson("/delete_entry", { id: entryId });
      const data = await response.json();
      if (!response.ok || data.status !== "success") {
        throw new Error(data.message || "Failed to delete entry");
      }
      await fetchEnergyData(currentRange);
      fetchEnergySavings();
    } catch (error) {
      console.error("Delete entry error:", error);
      alert("Failed to delete the entry: " + error.message);
    }
  }

  document.querySelectorAll(".filter-btn").forEach((button) => {
    button.addEventListener("click", () => {
      currentRange = button.dataset.range;
      fetchEnergyData(currentRange);
    });
  });

  const applyDateFilterBtn = document.getElementById("filter-btn");
  if (applyDateFilterBtn) {
    applyDateFilterBtn.addEventListener("click", () => {
      currentRange = "all";
      fetchEnergyData(currentRange);
    });
  }

  const logoutBtn = document.getElementById("logout");
  if (logoutBtn) {
    logoutBtn.addEventListener("click", () => {
      getJson("/logout").finally(() => {
        window.location.href = "/";
      });
    });
  }

  async function fetchEnergySavings() {
    const savingsEl = document.getElementById("savings-result");
    if (!savingsEl) return;
    try {
      const response = await getJson("/calculate_savings");
      const data = await response.json();
      savingsEl.textContent = data.status === "success"
        ? `$${num(data.savings).toFixed(2)}`
        : "Unable to calculate savings.";
    } catch (error) {
      savingsEl.textContent = "Error fetching savings data.";
    }
  }

  async function fetchEnergyTips() {
    const tipsEl = document.getElementById("energy-tips");
    if (!tipsEl) return;
    try {
      const response = await getJson("/energy_tips");
      const data = await response.json();
      if (data.status !== "success") {
        tipsEl.innerHTML = "<li>Unable to fetch tips.</li>";
        return;
      }
      tipsEl.innerHTML = "";
      data.tips.forEach((tip) => {
        const li = document.createElement("li");
        li.textContent = tip;
        tipsEl.appendChild(li);
      });
    } catch (error) {
      tipsEl.innerHTML = "<li>Error loading tips.</li>";
    }
  }

  const setMetric = (id, text) => {
    const el = document.getElementById(id);
    if (el) el.textContent = text;
  };

  const appendRecommendations = (list, heading, items) => {
    if (!items || !items.length) return;
    const header = document.createElement("li");
    const strong = document.createElement("strong");
    strong.textContent = heading;
    header.appendChild(strong);
    list.appendChild(header);
    items.forEach((item) => {
      const li = document.createElement("li");
      li.textContent = item;
      list.appendChild(li);
    });
  };

  async function fetchAnalytics() {
    try {
      const response = await getJson("/get_analytics");
      const data = await response.json();
      if (!response.ok || data.status !== "success" || !data.analysis) {
        throw new Error(data.message || "Failed to get analytics data");
      }
      const analysis = data.analysis;
      setMetric("current-pattern", `Current consumption pattern: ${num(analysis.current_pattern).toFixed(2)} kWh`);
      setMetric("next-hour-pred", `Predicted next hour: ${num(analysis.next_hour_prediction).toFixed(2)} kWh`);
      setMetric("carbon-footprint", `Total carbon footprint: ${num(analysis.carbon_footprint).toFixed(2)} kg CO2`);
      setMetric("energy-cost", `Total energy cost: $${num(analysis.energy_cost).toFixed(2)}`);

      const list = document.getElementById("recommendations");
      if (list) {
        list.innerHTML = "";
        const recs = analysis.recommendations || {};
        appendRecommendations(list, "Carbon Reduction Tips:", recs.carbon);
        appendRecommendations(list, "Cost Saving Tips:", recs.cost);
        if (!list.children.length) {
          const li = document.createElement("li");
          li.textContent = "No recommendations available at this time.";
          list.appendChild(li);
        }
      }
    } catch (error) {
      console.error("Analytics fetch error:", error);
      ["current-pattern", "next-hour-pred", "carbon-footprint", "energy-cost"].forEach((id) => {
        const el = document.getElementById(id);
        if (el) el.innerHTML = '<span class="text-danger">Error loading data</span>';
      });
      const list = document.getElementById("recommendations");
      if (list) list.innerHTML = '<li class="text-danger">Error loading recommendations</li>';
    }
  }

  const debouncedFetchAnalytics = debounce(fetchAnalytics, 1000);

  let forecastChart = null;

  async function fetchSolarForecast(lat, lon) {
    const status = document.getElementById("forecast-status");
    const params = new URLSearchParams({ lat, lon });
    try {
      const response = await getJson(`/api/solar_forecast?${params}`);
      const result = await response.json();
      if (!response.ok || result.status !== "success") {
        if (status) status.textContent = result.message || "Forecast unavailable";
        return;
      }
      const hourly = (result.forecast && result.forecast.hourly) || {};
      renderForecastChart(hourly.time || [], hourly.shortwave_radiation || []);
      if (status) status.textContent = "";
    } catch (error) {
      console.error("Forecast fetch error:", error);
      if (status) status.textContent = "Forecast unavailable";
    }
  }

  function renderForecastChart(times, radiation) {
    const canvas = document.getElementById("forecastChart");
    if (!canvas || typeof Chart === "undefined") return;
    if (forecastChart) {
      forecastChart.destroy();
    }
    forecastChart = new Chart(canvas.getContext("2d"), {
      type: "line",
      data: {
        labels: times.map((t) => t.replace("T", " ")),
        datasets: [
          {
            label: "Shortwave radiation (W/m²)",
            data: radiation,
            borderColor: "#f5a623",
            backgroundColor: "rgba(245, 166, 35, 0.2)",
            fill: true,
            tension: 0.3,
          },
        ],
      },
      options: { responsive: true, scales: { y: { beginAtZero: true } } },
    });
  }

  const forecastForm = document.getElementById("forecast-form");
  if (forecastForm) {
    const readCoords = () => [
      document.getElementById("forecast-lat").value,
      document.getElementById("forecast-lon").value,
    ];
    forecastForm.addEventListener("submit", (event) => {
      event.preventDefault();
      fetchSolarForecast(...readCoords());
    });
    fetchSolarForecast(...readCoords());
  }

  if (window.location.pathname.startsWith("/dashboard")) {
    fetchEnergyData(currentRange);
    fetchEnergySavings();
    fetchEnergyTips();
  }
});
"##;
