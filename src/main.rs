//! Native driver: segment one image from the command line.
//!
//! Each `--object` lists the prompt points of one object in native pixels,
//! e.g. `--object "120,80 140,95 60,40:neg"`. Objects are sent in order,
//! optional text-prompted detections are merged afterwards, and the result
//! is written as an artifact plus an optional overlay PNG.

#[cfg(not(target_arch = "wasm32"))]
mod driver {
    use std::error::Error;
    use std::path::PathBuf;
    use std::sync::Arc;

    use clap::Parser;

    use labelseg::backend::AutoAnnotateRequest;
    use labelseg::format::{ExportOptions, FormatRegistry};
    use labelseg::render::{RenderOptions, render};
    use labelseg::session::LogObserver;
    use labelseg::{
        AnnotatorConfig, ClientPoint, DisplayRect, HttpBackend, ImageFile, PixmapSurface, Point,
        PointKind, Session, SessionOptions,
    };

    /// Prompt points of one object.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ObjectPrompts(pub Vec<Point>);

    /// Parse `x,y[:neg] x,y ...`.
    pub fn parse_object(value: &str) -> Result<ObjectPrompts, String> {
        let points = value
            .split_whitespace()
            .map(|token| {
                let (coords, kind) = match token.split_once(':') {
                    Some((coords, "neg")) => (coords, PointKind::Negative),
                    Some((coords, "pos")) => (coords, PointKind::Positive),
                    Some((_, other)) => return Err(format!("unknown point kind '{}'", other)),
                    None => (token, PointKind::Positive),
                };
                let (x, y) = coords
                    .split_once(',')
                    .ok_or_else(|| format!("expected x,y but got '{}'", coords))?;
                let x: f32 = x.trim().parse().map_err(|_| format!("bad x in '{}'", token))?;
                let y: f32 = y.trim().parse().map_err(|_| format!("bad y in '{}'", token))?;
                Ok(Point::new(x, y, kind))
            })
            .collect::<Result<Vec<_>, String>>()?;

        if points.is_empty() {
            return Err("object needs at least one point".to_string());
        }
        Ok(ObjectPrompts(points))
    }

    #[derive(Debug, Parser)]
    #[command(name = "labelseg-native", version, about = "Point-prompted image segmentation")]
    pub struct Args {
        /// Image to annotate
        pub image: PathBuf,

        /// Config file (defaults to the user config directory)
        #[arg(long)]
        pub config: Option<PathBuf>,

        /// Segmentation service base URL, overriding the config
        #[arg(long)]
        pub backend: Option<String>,

        /// Prompt points for one object; repeat for more objects
        #[arg(long = "object", value_parser = parse_object)]
        pub objects: Vec<ObjectPrompts>,

        /// Text prompt for automatic detection, e.g. "dog. cat."
        #[arg(long)]
        pub detect: Option<String>,

        /// Artifact format id
        #[arg(long, default_value = "json")]
        pub format: String,

        /// Directory the artifact is written to
        #[arg(long, short, default_value = ".")]
        pub out_dir: PathBuf,

        /// Also write the rendered overlay to this PNG
        #[arg(long)]
        pub overlay: Option<PathBuf>,

        /// Only check that the service is reachable
        #[arg(long)]
        pub health: bool,

        /// Write the effective configuration to the config path
        #[arg(long)]
        pub save_config: bool,
    }

    fn load_config(args: &Args) -> Result<AnnotatorConfig, Box<dyn Error>> {
        let mut config = match &args.config {
            Some(path) => AnnotatorConfig::load(path)?,
            None => AnnotatorConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(url) = &args.backend {
            config.backend.base_url = url.clone();
        }
        Ok(config)
    }

    pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
        let config = load_config(&args)?;
        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();

        if args.save_config {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => AnnotatorConfig::default_path().ok_or("no config directory available")?,
            };
            config.save(&path)?;
        }

        let backend = HttpBackend::from_config(&config.backend)?;
        let session = Session::new(backend, SessionOptions::from_config(&config))
            .with_observer(Arc::new(LogObserver));

        if args.health {
            let health = session.check_health().await?;
            println!("{}: {}", session.backend().api_url(), health.status);
            return Ok(());
        }

        let registry = FormatRegistry::new();
        let format = registry.require(&args.format)?;

        let bytes = std::fs::read(&args.image)?;
        let file_name = args
            .image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = session.load_image(ImageFile::from_path_name(file_name, bytes))?;
        let session_id = session.start_session().await?;
        log::info!("Session {} on {}x{} image", session_id, size.width, size.height);

        // Clicks land on a 1:1 display of the native image.
        let rect = DisplayRect::sized(size.width as f32, size.height as f32);
        let result = async {
            for (index, prompts) in args.objects.iter().enumerate() {
                if index > 0 {
                    session.advance_to_next_object().await?;
                }
                for point in &prompts.0 {
                    session
                        .add_point(ClientPoint::new(point.x, point.y), rect, point.kind)
                        .await?;
                }
            }

            if let Some(prompt) = &args.detect {
                let request = AutoAnnotateRequest::new(prompt.as_str()).with_thresholds(
                    config.detector.box_threshold,
                    config.detector.text_threshold,
                );
                let ids = session.auto_annotate(&request).await?;
                log::info!("Detector added {} objects", ids.len());
            }

            let snapshot = session.snapshot();
            if let Some(path) = &args.overlay {
                let mut surface = PixmapSurface::new();
                let options = RenderOptions::from_config(&config.render, snapshot.coordinate_space);
                render(&mut surface, &snapshot.objects, rect, size, &options);
                std::fs::write(path, surface.encode_png()?)?;
                log::info!("Wrote overlay to {:?}", path);
            }

            let exported = format.export(&snapshot, &args.out_dir, &ExportOptions::new())?;
            println!("{}", exported.path.display());
            Ok::<(), Box<dyn Error>>(())
        }
        .await;

        session.end_session().await;
        result
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use clap::Parser;

    let args = driver::Args::parse();
    if let Err(e) = driver::run(args).await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
