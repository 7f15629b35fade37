use std::path::PathBuf;

/// Builder-style render configuration. Mirrors the driver API's documented
/// parameter defaults: 1920x1080 @ 30fps, `worker_count = cpu-1`.
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub worker_count: Option<usize>,
    pub timeline_path: Option<PathBuf>,
    pub keep_work_dir: bool,
    pub on_progress: Option<Box<dyn FnMut(usize, usize) + Send>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            worker_count: None,
            timeline_path: None,
            keep_work_dir: false,
            on_progress: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    pub fn timeline_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.timeline_path = Some(path.into());
        self
    }

    pub fn keep_work_dir(mut self, keep: bool) -> Self {
        self.keep_work_dir = keep;
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(usize, usize) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = RenderOptions::default();
        assert_eq!(opts.width, 1920);
        assert_eq!(opts.height, 1080);
        assert_eq!(opts.fps, 30);
        assert!(opts.worker_count.is_none());
        assert!(!opts.keep_work_dir);
    }

    #[test]
    fn builder_overrides_apply() {
        let opts = RenderOptions::new().width(640).height(480).fps(24).worker_count(2);
        assert_eq!(opts.width, 640);
        assert_eq!(opts.height, 480);
        assert_eq!(opts.fps, 24);
        assert_eq!(opts.worker_count, Some(2));
    }
}
