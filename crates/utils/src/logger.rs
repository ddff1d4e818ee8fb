use std::fs;
use time::macros::offset;
use tracing_subscriber::filter::{FilterFn, LevelFilter};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};
use tracing_appender::{non_blocking, rolling};

/// 日志管理器 - 基于target分类的日志系统
pub struct LoggerManager {
    _guards: Vec<non_blocking::WorkerGuard>,
}

impl LoggerManager {
    /// 初始化日志系统
    ///
    /// 日志分类：
    /// - app.log: 通用应用日志
    /// - relay.log: 中继请求/响应日志
    /// - opportunity.log: 套利机会发现与竞速日志
    pub fn init() -> Self {
        let mut guards = Vec::new();

        // 创建日志目录
        fs::create_dir_all("logs").ok();

        // 配置时区为东八区 (UTC+8 上海时间)
        let timer = OffsetTime::new(
            offset!(+8),
            time::format_description::well_known::Rfc3339,
        );

        // 1. 控制台输出 - INFO 级别
        let console_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::INFO);

        // 2. 通用应用日志 (app.log)
        let (app_writer, app_guard) = {
            let appender = rolling::daily("logs", "app.log");
            non_blocking(appender)
        };
        guards.push(app_guard);

        let app_layer = fmt::layer()
            .compact()
            .with_writer(app_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::INFO)
            .with_filter(FilterFn::new(|metadata| {
                // 排除专用文件的 target
                !matches!(metadata.target(), "relay" | "arbitrage_opportunity")
            }));

        // 3. 中继日志 (relay.log)
        let (relay_writer, relay_guard) = {
            let appender = rolling::daily("logs", "relay.log");
            non_blocking(appender)
        };
        guards.push(relay_guard);

        let relay_layer = fmt::layer()
            .compact()
            .with_writer(relay_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(FilterFn::new(|metadata| metadata.target() == "relay"));

        // 4. 套利机会日志 (opportunity.log)
        let (opportunity_writer, opportunity_guard) = {
            let appender = rolling::daily("logs", "opportunity.log");
            non_blocking(appender)
        };
        guards.push(opportunity_guard);

        let opportunity_layer = fmt::layer()
            .compact()
            .with_writer(opportunity_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() == "arbitrage_opportunity"
            }));

        // 初始化tracing订阅器
        tracing_subscriber::registry()
            .with(console_layer)
            .with(app_layer)
            .with(relay_layer)
            .with(opportunity_layer)
            .init();

        Self { _guards: guards }
    }
}
