pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Rank Tracker</title>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    body { font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 20px; background: #f8f9fa; color: #333; }
    .card { background: #fff; padding: 24px; border-radius: 12px; margin: 16px 0; border: 1px solid #e9ecef; }
    label { display: block; margin: 12px 0 4px; font-weight: 600; }
    input, select { width: 100%; padding: 10px; border: 1px solid #ced4da; border-radius: 6px; font-size: 15px; box-sizing: border-box; }
    button { margin-top: 16px; width: 100%; padding: 12px; border: 0; border-radius: 6px; background: #667eea; color: #fff; font-size: 16px; cursor: pointer; }
    button:disabled { opacity: .6; cursor: wait; }
    .row { display: flex; gap: 16px; }
    .row > div { flex: 1; }
    .item { padding: 10px 0; border-bottom: 1px solid #eee; }
    .pos { display: inline-block; min-width: 2em; font-weight: bold; color: #667eea; }
    .domain { color: #28a745; }
    .error { background: #f8d7da; color: #721c24; padding: 12px; border-radius: 6px; }
  </style>
</head>
<body>
  <h1>Rank Tracker</h1>
  <div class="card">
    <form id="form">
      <label for="keyword">Keyword</label>
      <input id="keyword" required placeholder="pizza near me">
      <label for="address">Location</label>
      <input id="address" required placeholder="New York, NY">
      <div class="row">
        <div><label for="pincode">Postal code</label><input id="pincode"></div>
        <div><label for="country">Country</label><input id="country"></div>
      </div>
      <div class="row">
        <div><label for="device">Device</label>
          <select id="device"><option>desktop</option><option>mobile</option></select></div>
        <div><label for="language">Language</label>
          <select id="language"><option>en</option><option>es</option><option>fr</option><option>de</option>
            <option>it</option><option>pt</option><option>ru</option><option>ja</option><option>ko</option><option>zh</option></select></div>
        <div><label for="depth">Depth</label><input id="depth" type="number" min="1" max="100" value="20"></div>
      </div>
      <button id="submit" type="submit">Check rankings</button>
    </form>
  </div>
  <div id="results"></div>
  <script>
    const $ = (id) => document.getElementById(id);
    const esc = (s) => String(s ?? '').replace(/[&<>"]/g, (c) => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[c]));

    $('form').addEventListener('submit', async (e) => {
      e.preventDefault();
      $('submit').disabled = true;
      $('results').innerHTML = '<div class="card">Loading...</div>';
      const body = {
        keyword: $('keyword').value,
        location: {
          address: $('address').value,
          pincode: $('pincode').value || null,
          country: $('country').value || null,
        },
        device: $('device').value,
        language_code: $('language').value,
        depth: parseInt($('depth').value, 10),
      };
      try {
        const res = await fetch('/api/check-rankings', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(body),
        });
        const data = await res.json();
        if (!res.ok) throw new Error(data.error || res.statusText);
        render(data);
      } catch (err) {
        $('results').innerHTML = `<div class="error">${esc(err.message)}</div>`;
      } finally {
        $('submit').disabled = false;
      }
    });

    function render(data) {
      const loc = data.location;
      const organic = data.organic_results.map((r) => `
        <div class="item"><span class="pos">${esc(r.position)}</span>
          <a href="${esc(r.url)}">${esc(r.title)}</a> <span class="domain">${esc(r.domain)}</span>
          <div>${esc(r.description)}</div></div>`).join('') || '<p>No organic results.</p>';
      const maps = data.maps_results.map((r) => `
        <div class="item"><span class="pos">${esc(r.position)}</span> <strong>${esc(r.title)}</strong>
          <div>${esc(r.address)} ${esc(r.phone)}</div>
          <div>${r.rating != null ? esc(r.rating) + ' (' + esc(r.reviews_count) + ' reviews)' : ''}</div></div>`).join('') || '<p>No maps results.</p>';
      $('results').innerHTML = `
        <div class="card"><strong>${esc(data.keyword)}</strong> near ${esc(loc.address)}
          (${loc.latitude.toFixed(4)}, ${loc.longitude.toFixed(4)}) in ${esc(data.processing_time_seconds)}s</div>
        <div class="card"><h2>Organic</h2>${organic}</div>
        <div class="card"><h2>Maps</h2>${maps}</div>`;
    }
  </script>
</body>
</html>
"#;
