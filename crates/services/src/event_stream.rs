//! 重连式事件流客户端
//!
//! 消费 MEV-Share 风格的 SSE 推送端点，按载荷中的 `event` 判别字段
//! 分发给订阅者。连接失败进入 Reconnecting 状态，按固定间隔重连，
//! 直到调用方显式 close。事件源在断连期间推送的消息不做补偿，
//! 调用方应把断连间隙理解为"没有事件"，而不是"没有机会"。

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};

use utils::{record_reconnect, record_stream_event};

/// 重连策略：固定间隔，无抖动、无上限、无次数限制
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// 下一次重连前的等待时长
    pub fn next_delay(&self) -> Duration {
        self.delay
    }
}

/// 事件流配置
#[derive(Debug, Clone)]
pub struct EventStreamConfig {
    pub url: String,
    pub reconnect: ReconnectPolicy,
}

/// 连接状态机：Connected ⇄ Reconnecting，Closed 为唯一终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connected,
    Reconnecting,
    Closed,
}

type ListenerMap = HashMap<String, Vec<mpsc::UnboundedSender<Value>>>;

/// 事件流客户端
pub struct EventStream {
    config: EventStreamConfig,
    http: reqwest::Client,
    /// 按事件类型组织的订阅者，同一类型内保持注册顺序
    listeners: RwLock<ListenerMap>,
    state: RwLock<StreamState>,
    shutdown_tx: watch::Sender<bool>,
}

impl EventStream {
    pub fn new(config: EventStreamConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            http: reqwest::Client::new(),
            listeners: RwLock::new(HashMap::new()),
            state: RwLock::new(StreamState::Reconnecting),
            shutdown_tx,
        }
    }

    /// 注册事件订阅
    ///
    /// 同一事件类型的订阅者按注册顺序收到每个匹配事件；
    /// 丢弃接收端即退订，发送端在下次分发时被剔除。
    pub async fn subscribe(&self, event_type: &str) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.listeners.write().await;
        listeners.entry(event_type.to_string()).or_default().push(tx);
        rx
    }

    pub async fn state(&self) -> StreamState {
        *self.state.read().await
    }

    /// 关闭事件流；任何在途的重连等待被取消而不是被忽略
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            *state = StreamState::Closed;
        }
        let _ = self.shutdown_tx.send(true);
        info!("事件流已关闭: {}", self.config.url);
    }

    /// 连接并持续分发事件，直到 close 被调用
    ///
    /// 连接错误不向调用方传播，内部按重连策略恢复。
    pub async fn run(&self) {
        let mut shutdown = self.shutdown_tx.subscribe();

        loop {
            if self.is_closed().await {
                break;
            }

            match self.connect_and_dispatch(&mut shutdown).await {
                Ok(_) => info!("事件流连接结束: {}", self.config.url),
                Err(e) => warn!("事件流连接错误: {e:#}"),
            }

            if self.is_closed().await {
                break;
            }

            self.set_state(StreamState::Reconnecting).await;
            record_reconnect();
            let delay = self.config.reconnect.next_delay();
            debug!("{:?} 后重连事件流: {}", delay, self.config.url);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.set_state(StreamState::Closed).await;
    }

    async fn connect_and_dispatch(&self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let response = self
            .http
            .get(&self.config.url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("事件源返回 {}", response.status()));
        }

        self.set_state(StreamState::Connected).await;
        info!("📡 事件流已连接: {}", self.config.url);

        let mut body = response.bytes_stream();
        let mut parser = SseParser::default();

        loop {
            tokio::select! {
                chunk = body.next() => {
                    match chunk {
                        Some(Ok(bytes)) => {
                            for frame in parser.push(&bytes) {
                                self.dispatch(&frame).await;
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        // 服务端关闭连接，走重连路径
                        None => return Ok(()),
                    }
                }
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }

    /// 解码一帧并按 `event` 判别字段分发
    ///
    /// 格式错误的帧只记录诊断日志后丢弃，绝不中断事件流。
    async fn dispatch(&self, frame: &str) {
        let value: Value = match serde_json::from_str(frame) {
            Ok(v) => v,
            Err(e) => {
                warn!("丢弃无法解码的事件帧: {e}");
                return;
            }
        };

        let Some(event_type) = value.get("event").and_then(Value::as_str) else {
            warn!("丢弃缺少 event 判别字段的帧");
            return;
        };
        let event_type = event_type.to_string();

        record_stream_event();

        let mut listeners = self.listeners.write().await;
        let Some(senders) = listeners.get_mut(&event_type) else {
            debug!("事件 {} 没有订阅者", event_type);
            return;
        };

        // 按注册顺序分发；接收端已释放的订阅者在此剔除
        senders.retain(|tx| tx.send(value.clone()).is_ok());
    }

    async fn is_closed(&self) -> bool {
        *self.state.read().await == StreamState::Closed
    }

    async fn set_state(&self, next: StreamState) {
        let mut state = self.state.write().await;
        // Closed 是终态，不允许回退
        if *state != StreamState::Closed {
            *state = next;
        }
    }
}

/// 增量 SSE 帧解析器
///
/// 按行累积 `data:` 字段，空行结束一帧；注释行与其余字段忽略，
/// 事件类型由载荷内的判别字段决定。
#[derive(Debug, Default)]
struct SseParser {
    /// 未读完的行
    line_buf: String,
    /// 当前帧累积的 data 行
    data_buf: Vec<String>,
}

impl SseParser {
    /// 喂入一段字节，返回其中完整的事件帧
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut frames = Vec::new();
        self.line_buf.push_str(&String::from_utf8_lossy(bytes));

        while let Some(pos) = self.line_buf.find('\n') {
            let line: String = self.line_buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data_buf.is_empty() {
                    frames.push(self.data_buf.join("\n"));
                    self.data_buf.clear();
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_buf.push(data.trim_start().to_string());
            }
            // event:/id:/retry: 字段与 ":" 注释行忽略
        }

        frames
    }
}
