/// 障碍物时间平滑 (Obstacle Smoother)
///
/// 输入: JSON Lines 观测帧 (--input) 或合成场景 (--simulate)
/// 输出: 每帧已确认障碍物快照, JSON Lines 写到标准输出 (日志在标准错误)
///
/// 线程模式 (--threaded):
/// 1. 输入线程: 读取/生成观测帧 → FrameMessage
/// 2. 平滑线程: 平滑 → ChannelSink
/// 3. 主线程:   接收快照 → 输出端
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use obstacle_smoother_rs::input::{FrameReader, SceneConfig, SyntheticScene};
use obstacle_smoother_rs::pipeline::{spawn_worker, FrameMessage};
use obstacle_smoother_rs::{
    gen_time_string, ChannelSink, JsonLinesSink, LogSink, ObstacleSink, ObstacleSmoother,
    ObstacleSnapshot, Shape, SmootherConfig, SmootherError,
};

type Frames = Box<dyn Iterator<Item = Result<Vec<Shape>>> + Send>;
type Outputs = Vec<Box<dyn ObstacleSink + Send>>;

/// 障碍物时间平滑程序
#[derive(Parser, Debug)]
#[command(author, version, about = "障碍物时间平滑 (匹配 / 确认 / 删除 / 几何平滑)", long_about = None)]
struct Args {
    /// 观测帧文件 (JSON Lines, `-` 表示标准输入)
    #[arg(short, long, conflicts_with = "simulate")]
    input: Option<PathBuf>,

    /// 使用合成场景, 生成指定帧数
    #[arg(short, long)]
    simulate: Option<usize>,

    /// 合成场景随机种子
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// 合成场景障碍物数量
    #[arg(long, default_value_t = 3)]
    obstacles: usize,

    /// 配置文件 (JSON), 不存在时写入默认配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 匹配阈值 (距离²), 覆盖配置文件
    #[arg(long)]
    match_threshold: Option<f64>,

    /// 确认所需连续帧数, 覆盖配置文件
    #[arg(long)]
    found_threshold: Option<u32>,

    /// 删除所需连续丢失帧数, 覆盖配置文件
    #[arg(long)]
    lost_threshold: Option<u32>,

    /// 组合体刷新周期 (0 关闭), 覆盖配置文件
    #[arg(long)]
    refresh_period: Option<u64>,

    /// 平滑在独立线程中运行
    #[arg(long)]
    threaded: bool,

    /// 同时记录到 records/obstacles_<时间>.jsonl
    #[arg(long)]
    record: bool,

    /// 每隔多少帧打印一次障碍物摘要 (0 关闭)
    #[arg(long, default_value_t = 30)]
    log_every: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn build_config(args: &Args) -> Result<SmootherConfig> {
    let mut config = match &args.config {
        Some(path) => SmootherConfig::load_or_create(path)?,
        None => SmootherConfig::default(),
    };
    if let Some(v) = args.match_threshold {
        config.match_threshold = v;
    }
    if let Some(v) = args.found_threshold {
        config.found_threshold = v;
    }
    if let Some(v) = args.lost_threshold {
        config.lost_threshold = v;
    }
    if let Some(v) = args.refresh_period {
        config.refresh_period = v;
    }
    config.validate()?;
    Ok(config)
}

fn build_outputs(args: &Args) -> Result<Outputs> {
    let mut outputs: Outputs = Vec::new();
    outputs.push(Box::new(JsonLinesSink::new(BufWriter::new(io::stdout()))));
    if args.record {
        fs::create_dir_all("records")?;
        let path = format!("records/obstacles_{}.jsonl", gen_time_string(""));
        info!("📝 记录快照到 {}", path);
        outputs.push(Box::new(JsonLinesSink::new(BufWriter::new(File::create(&path)?))));
    }
    if args.log_every > 0 {
        outputs.push(Box::new(LogSink::new(args.log_every)));
    }
    Ok(outputs)
}

fn build_frames(args: &Args) -> Result<Frames> {
    match (&args.input, args.simulate) {
        (Some(path), _) => {
            info!("📹 回放观测: {}", path.display());
            Ok(Box::new(FrameReader::open(path)?))
        }
        (None, Some(frames)) => {
            info!("🎲 合成场景: {} 帧, {} 个障碍物, 种子 {}", frames, args.obstacles, args.seed);
            let scene = SyntheticScene::new(
                SceneConfig {
                    obstacles: args.obstacles,
                    ..Default::default()
                },
                args.seed,
            );
            Ok(Box::new(scene.take(frames).map(Ok)))
        }
        (None, None) => bail!("either --input or --simulate is required"),
    }
}

fn run_inline(mut smoother: ObstacleSmoother, frames: Frames, outputs: Outputs) -> Result<()> {
    for sink in outputs {
        smoother.attach_boxed_sink(sink);
    }
    for frame in frames {
        let frame = frame?;
        match smoother.process_frame(&frame) {
            Ok(_) => {}
            Err(err @ SmootherError::InvalidObservation { .. }) => {
                warn!("⚠️ 跳过无效帧: {}", err)
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!("✅ {}", smoother.stats());
    Ok(())
}

fn run_threaded(mut smoother: ObstacleSmoother, frames: Frames, mut outputs: Outputs) -> Result<()> {
    // Channel 1: 输入线程 → 平滑线程
    let (tx_frames, rx_frames) = bounded::<FrameMessage>(60);
    // Channel 2: 平滑线程 → 主线程 (快照副本)
    let (tx_snapshots, rx_snapshots) = bounded::<ObstacleSnapshot>(60);

    smoother.attach_sink(ChannelSink::new(tx_snapshots));
    let worker = spawn_worker(smoother, rx_frames);

    let feeder = thread::spawn(move || -> Result<()> {
        for frame in frames {
            let frame = frame?;
            if tx_frames.send(FrameMessage::Frame(frame)).is_err() {
                break;
            }
        }
        let _ = tx_frames.send(FrameMessage::Shutdown);
        Ok(())
    });

    // 平滑线程退出后 ChannelSink 被释放, 接收循环随之结束
    for snapshot in rx_snapshots.iter() {
        for sink in outputs.iter_mut() {
            sink.update_obstacles(&snapshot).map_err(|e| anyhow!(e))?;
        }
    }

    feeder
        .join()
        .map_err(|_| anyhow!("input thread panicked"))??;
    let summary = worker
        .join()
        .map_err(|_| anyhow!("smoother thread panicked"))??;
    info!(
        "✅ 处理 {} 帧 | 丢弃 {} 帧 | 跟踪 {} | 确认 {}",
        summary.frames, summary.rejected, summary.tracked, summary.confirmed
    );
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let smoother = ObstacleSmoother::new(build_config(&args)?)?;
    smoother.config().log_summary();
    let outputs = build_outputs(&args)?;
    let frames = build_frames(&args)?;

    if args.threaded {
        run_threaded(smoother, frames, outputs)
    } else {
        run_inline(smoother, frames, outputs)
    }
}
