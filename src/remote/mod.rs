//! 远端补全与旁路通道的轻量 HTTP 客户端。
//!
//! 每个客户端只发一次请求，不做重试；阻塞调用统一移交
//! `tokio::task::spawn_blocking`。

mod completion;
mod error;
mod feed;
mod log;

pub use completion::HttpCompletionClient;
pub use error::RemoteError;
pub use feed::HttpFeedClient;
pub use log::HttpLogClient;

use std::time::Duration;

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    /// 返回一次固定响应并捕获请求原文的单连接服务器。
    pub(crate) fn serve_once(response: String) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
        let address = listener.local_addr().expect("local addr available");
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            if let Ok((mut stream, _)) = listener.accept() {
                captured = read_request(&mut stream);
                stream
                    .write_all(response.as_bytes())
                    .expect("response written");
            }
            captured
        });
        (format!("http://{address}"), handle)
    }

    /// 接收请求后挂起指定时长，不写任何响应。
    pub(crate) fn serve_stalled(delay: Duration) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
        let address = listener.local_addr().expect("local addr available");
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _ = read_request(&mut stream);
                thread::sleep(delay);
            }
        });
        (format!("http://{address}"), handle)
    }

    pub(crate) fn body_of(raw: &[u8]) -> String {
        let header_end = raw
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4)
            .unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[header_end..]).into_owned()
    }

    fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut captured = Vec::new();
        let mut buffer = [0_u8; 1024];
        loop {
            match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    captured.extend_from_slice(&buffer[..read]);
                    if request_complete(&captured) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        captured
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(header_end) = raw.windows(4).position(|window| window == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&raw[..header_end]);
        let content_length = headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    pub(crate) fn json_response(status: u16, status_text: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status} {status_text}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }
}
