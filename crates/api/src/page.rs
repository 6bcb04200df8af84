use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// Single page: table + chart + checklist, all fed by the JSON endpoints. The page polls
// /api/snapshot and re-renders when a refresh publishes a new generation.
const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Hibor per Maturity</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { background: #222; color: #fff; font-family: Lato, Helvetica, Arial, sans-serif; margin: 1.5rem; }
  h4 { font-weight: 400; }
  .table-wrap { height: 350px; overflow-y: auto; }
  table { border-collapse: collapse; }
  th { position: sticky; top: 0; background: rgb(30, 30, 30); color: #fff; }
  th, td { min-width: 95px; max-width: 95px; width: 95px; padding: 4px 8px; text-align: right; }
  th:first-child, td:first-child { text-align: left; }
  tbody tr { background: rgb(50, 50, 50); }
  tbody tr:nth-child(even) { background: rgb(80, 80, 80); }
  tbody tr.hl-max { background: #e6196e; }
  tbody tr.hl-min { background: #196ee6; }
  .pager { margin: 0.5rem 0; }
  .pager button { background: #375a7f; color: #fff; border: 0; padding: 4px 10px; }
  #checklist { display: flex; align-items: center; justify-content: center; gap: 1rem; }
</style>
</head>
<body>
<h4>Hibor per Maturity</h4>

<div class="table-wrap">
  <table id="tbl"><thead></thead><tbody></tbody></table>
</div>
<div class="pager">
  <button id="prev">&lsaquo;</button>
  <span id="page-label"></span>
  <button id="next">&rsaquo;</button>
</div>

<br><br>
<div id="graph"></div>
<div id="checklist"></div>

<script>
const PAGE_SIZE = 10;
let page = 0;
let pageCount = 1;
let generation = null;

async function getJson(url) {
  const res = await fetch(url);
  if (!res.ok) throw new Error(url + " -> " + res.status);
  return res.json();
}

async function renderTable() {
  const data = await getJson(`/api/table?page=${page}&page_size=${PAGE_SIZE}`);
  pageCount = Math.max(data.page_count, 1);
  document.querySelector("#tbl thead").innerHTML =
    "<tr>" + data.columns.map(c => `<th>${c}</th>`).join("") + "</tr>";
  document.querySelector("#tbl tbody").innerHTML = data.rows.map(row => {
    const cls = row.highlight.min ? "hl-min" : (row.highlight.max ? "hl-max" : "");
    const cells = data.columns.map(c => `<td>${row[c] ?? ""}</td>`).join("");
    return `<tr class="${cls}">${cells}</tr>`;
  }).join("");
  document.getElementById("page-label").textContent = `${page + 1} / ${pageCount}`;
}

function selectedSeries() {
  return [...document.querySelectorAll("#checklist input:checked")].map(i => i.value);
}

async function renderChart() {
  const series = encodeURIComponent(selectedSeries().join(","));
  const fig = await getJson(`/api/chart?series=${series}`);
  const traces = fig.series.map(s => ({
    type: "scatter",
    mode: "lines",
    name: s.name,
    x: s.points.map(p => p.date),
    y: s.points.map(p => p.value),
  }));
  Plotly.react("graph", traces, {
    template: "plotly_dark",
    paper_bgcolor: "#222",
    plot_bgcolor: "#222",
    font: { color: "#fff" },
    xaxis: { title: "Date" },
    yaxis: { title: "value", tick0: fig.layout.y_tick0, dtick: fig.layout.y_dtick },
    legend: fig.layout.legend,
  });
}

async function renderChecklist() {
  const m = await getJson("/api/maturities");
  const box = document.getElementById("checklist");
  box.innerHTML = m.options.map(o =>
    `<label><input type="checkbox" value="${o}" ${m.default.includes(o) ? "checked" : ""}> ${o}</label>`
  ).join("");
  box.addEventListener("change", renderChart);
}

async function pollSnapshot() {
  try {
    const info = await getJson("/api/snapshot");
    if (generation !== null && info.generation !== generation) {
      await Promise.all([renderTable(), renderChart()]);
    }
    generation = info.generation;
  } catch (e) {
    console.error(e);
  }
}

document.getElementById("prev").onclick = () => { if (page > 0) { page--; renderTable(); } };
document.getElementById("next").onclick = () => { if (page + 1 < pageCount) { page++; renderTable(); } };

(async () => {
  await renderChecklist();
  await Promise.all([renderTable(), renderChart(), pollSnapshot()]);
  setInterval(pollSnapshot, 60000);
})();
</script>
</body>
</html>
"##;
