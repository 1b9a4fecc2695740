//! Try-on popup and the script that drives it.
//!
//! The popup talks to the try-on API routes: it posts the photo, polls the
//! job status until it completes, and cancels the job when closed.

use storefront_tryon::{SlideKind, TryOnView};

use super::escape_html;

/// Delay between status polls in the browser.
pub const POLL_INTERVAL_MS: u32 = 2000;

const UPLOAD_HINT: &str = "Upload a full body of yourself";

/// Render the popup for `view`. Without a queue credential only a disabled
/// trigger is rendered.
pub fn render_try_on(view: &TryOnView, enabled: bool, nonce: &str) -> String {
    if !enabled {
        return r#"<section class="try-on try-on--disabled" data-section="try-on" hidden></section>"#
            .to_string();
    }

    format!(
        r#"<section class="try-on" data-section="try-on">
    <div class="try-on-popup" data-try-on-popup{hidden}>
        <div class="try-on-dialog" role="dialog" aria-modal="true">
            <button type="button" class="try-on-close" data-try-on-close aria-label="Close">&times;</button>
            {body}
        </div>
    </div>
    <script nonce="{nonce}">{script}</script>
</section>"#,
        hidden = if view.open { "" } else { " hidden" },
        body = render_body(view),
        nonce = escape_html(nonce),
        script = try_on_script(),
    )
}

fn render_body(view: &TryOnView) -> String {
    let has_result = view.slides.iter().any(|s| s.kind == SlideKind::Result);
    if has_result {
        let slides: String = view
            .slides
            .iter()
            .map(|slide| {
                let alt = match slide.kind {
                    SlideKind::Result => "Result Image",
                    SlideKind::Preview => "Uploaded Image",
                };
                format!(
                    r#"<div class="try-on-slide"><img src="{}" alt="{}"></div>"#,
                    escape_html(&slide.url),
                    alt
                )
            })
            .collect();
        return format!(r#"<div class="try-on-carousel" data-try-on-carousel>{}</div>"#, slides);
    }

    let preview = match view.slides.first() {
        Some(slide) => format!(
            r#"<img class="try-on-preview" src="{}" alt="Preview">"#,
            escape_html(&slide.url)
        ),
        None => format!(r#"<p class="try-on-hint">{}</p>"#, UPLOAD_HINT),
    };
    let disabled = view.slides.is_empty() || view.processing;

    format!(
        r#"<div class="try-on-upload" data-try-on-upload>
                {preview}
                <label class="try-on-file">Upload image<input type="file" accept="image/*" data-try-on-file hidden></label>
                <button type="button" class="try-on-submit" data-try-on-submit{disabled}>{label}</button>
            </div>"#,
        preview = preview,
        disabled = if disabled { " disabled" } else { "" },
        label = if view.processing { "Processing..." } else { "Try On" },
    )
}

fn try_on_script() -> String {
    format!(
        r#"
(function () {{
  var root = document.currentScript.closest('[data-section="try-on"]');
  var popup = root.querySelector('[data-try-on-popup]');
  var file = root.querySelector('[data-try-on-file]');
  var submit = root.querySelector('[data-try-on-submit]');
  var upload = root.querySelector('[data-try-on-upload]');
  var job = null;
  var preview = null;
  var generation = 0;

  function cancel(id) {{
    fetch('/api/try-on/' + id, {{ method: 'DELETE' }});
  }}

  function reset() {{
    generation += 1;
    if (job) {{ cancel(job); }}
    job = null;
    if (preview) {{ URL.revokeObjectURL(preview); }}
    preview = null;
    file.value = '';
    submit.disabled = true;
    submit.textContent = 'Try On';
    var carousel = root.querySelector('[data-try-on-carousel]');
    if (carousel) {{ carousel.remove(); }}
    upload.hidden = false;
    var img = upload.querySelector('.try-on-preview');
    if (img) {{ img.remove(); }}
    if (!upload.querySelector('.try-on-hint')) {{
      var hint = document.createElement('p');
      hint.className = 'try-on-hint';
      hint.textContent = '{hint}';
      upload.insertBefore(hint, upload.firstChild);
    }}
  }}

  function showResult(url) {{
    var carousel = document.createElement('div');
    carousel.className = 'try-on-carousel';
    carousel.setAttribute('data-try-on-carousel', '');
    [[url, 'Result Image'], [preview, 'Uploaded Image']].forEach(function (s) {{
      var slide = document.createElement('div');
      slide.className = 'try-on-slide';
      var img = document.createElement('img');
      img.src = s[0];
      img.alt = s[1];
      slide.appendChild(img);
      carousel.appendChild(slide);
    }});
    upload.hidden = true;
    upload.parentNode.appendChild(carousel);
  }}

  function poll(id) {{
    if (job !== id) {{ return; }}
    fetch('/api/try-on/' + id).then(function (r) {{ return r.json(); }}).then(function (s) {{
      if (job !== id) {{ return; }}
      if (s.status === 'COMPLETED' && s.image_url) {{
        job = null;
        showResult(s.image_url);
      }} else if (s.status === 'IN_QUEUE' || s.status === 'IN_PROGRESS') {{
        setTimeout(function () {{ poll(id); }}, {interval});
      }} else {{
        throw new Error(s.error || 'try-on failed');
      }}
    }}).catch(function (e) {{
      console.error('Error during Try On:', e);
      job = null;
      submit.disabled = false;
      submit.textContent = 'Try On';
    }});
  }}

  document.querySelectorAll('[data-try-on-open]').forEach(function (b) {{
    b.addEventListener('click', function () {{ popup.hidden = false; }});
  }});
  root.querySelector('[data-try-on-close]').addEventListener('click', function () {{
    popup.hidden = true;
    reset();
  }});
  file.addEventListener('change', function () {{
    var chosen = file.files[0];
    if (!chosen) {{ return; }}
    reset();
    preview = URL.createObjectURL(chosen);
    var img = document.createElement('img');
    img.className = 'try-on-preview';
    img.alt = 'Preview';
    img.src = preview;
    var hint = upload.querySelector('.try-on-hint');
    if (hint) {{ hint.remove(); }}
    upload.insertBefore(img, upload.firstChild);
    submit.disabled = false;
  }});
  submit.addEventListener('click', function () {{
    var chosen = file.files[0];
    if (!chosen || job) {{ return; }}
    var submitted = generation;
    submit.disabled = true;
    submit.textContent = 'Processing...';
    fetch('/api/try-on', {{
      method: 'POST',
      headers: {{ 'content-type': chosen.type || 'application/octet-stream' }},
      body: chosen
    }}).then(function (r) {{
      if (!r.ok) {{ throw new Error('submit failed: ' + r.status); }}
      return r.json();
    }}).then(function (s) {{
      if (submitted !== generation) {{
        cancel(s.request_id);
        return;
      }}
      job = s.request_id;
      poll(job);
    }}).catch(function (e) {{
      if (submitted !== generation) {{ return; }}
      console.error('Error during Try On:', e);
      submit.disabled = false;
      submit.textContent = 'Try On';
    }});
  }});
}})();
"#,
        interval = POLL_INTERVAL_MS,
        hint = UPLOAD_HINT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_tryon::{TryOnConfig, TryOnSession, UploadedImage};

    #[test]
    fn test_initial_popup_is_hidden() {
        let view = TryOnSession::new(TryOnConfig::default()).view();
        let html = render_try_on(&view, true, "abc");

        assert!(html.contains("data-try-on-popup hidden"));
        assert!(html.contains("Upload a full body of yourself"));
        assert!(html.contains(r#"data-try-on-submit disabled>Try On</button>"#));
        assert!(html.contains(r#"<script nonce="abc">"#));
    }

    #[test]
    fn test_uploaded_photo_enables_submit() {
        let mut session = TryOnSession::new(TryOnConfig::default());
        session.open();
        session
            .upload(&UploadedImage::new(b"img".to_vec(), Some("image/png")))
            .unwrap();

        let html = render_try_on(&session.view(), true, "abc");
        assert!(html.contains("data-try-on-popup>"));
        assert!(html.contains(r#"<img class="try-on-preview" src="data:image/png;base64,aW1n""#));
        assert!(html.contains("data-try-on-submit>Try On</button>"));
    }

    #[test]
    fn test_result_comes_before_upload() {
        let mut session = TryOnSession::new(TryOnConfig::default());
        session
            .upload(&UploadedImage::new(b"img".to_vec(), Some("image/png")))
            .unwrap();
        session.begin().unwrap();
        let output: storefront_tryon::TryOnOutput =
            serde_json::from_str(r#"{"images":[{"url":"https://v3.fal.media/out.png"}]}"#).unwrap();
        session.complete(&output).unwrap();

        let html = render_try_on(&session.view(), true, "abc");
        let result = html.find("https://v3.fal.media/out.png").unwrap();
        let upload = html.find("data:image/png;base64,aW1n").unwrap();
        assert!(result < upload);
        assert!(!html.contains(r#"<div class="try-on-upload""#));
    }

    #[test]
    fn test_script_drops_submissions_from_before_reset() {
        let script = try_on_script();
        let reset = script.find("function reset()").unwrap();
        let bump = script.find("generation += 1;").unwrap();
        assert!(reset < bump);

        let stale = script.find("if (submitted !== generation)").unwrap();
        let accept = script.find("job = s.request_id;").unwrap();
        assert!(stale < accept);
        assert!(script[stale..accept].contains("cancel(s.request_id);"));
    }

    #[test]
    fn test_script_restores_hint_on_reset() {
        let script = try_on_script();
        let reset = script.find("function reset()").unwrap();
        let end = script.find("function showResult").unwrap();
        assert!(script[reset..end].contains("hint.textContent = 'Upload a full body of yourself';"));
    }

    #[test]
    fn test_disabled_without_credential() {
        let view = TryOnSession::new(TryOnConfig::default()).view();
        let html = render_try_on(&view, false, "abc");
        assert!(!html.contains("<script"));
    }
}
