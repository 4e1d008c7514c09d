//! 流式有损 UTF-8 解码
//!
//! 设备输出按 UTF-8 解码，非法序列替换为 U+FFFD。
//! 被两次读取切开的多字节字符会保留到下一次读取再解码，不会被替换。

use std::char::REPLACEMENT_CHARACTER;

/// 流式解码器（每次采集调用一个）
#[derive(Debug, Default)]
pub struct LossyDecoder {
    /// 上一块末尾不完整的序列（最多 3 字节）
    pending: Vec<u8>,
}

impl LossyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解码下一块字节
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        let carry_from = loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(s) => {
                    out.push_str(s);
                    break self.pending.len();
                },
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            start = valid + len;
                        },
                        // 序列在块末尾被截断，留给下一块
                        None => break valid,
                    }
                },
            }
        };

        self.pending.drain(..carry_from);
        out
    }

    /// 输出剩余字节（不完整的序列替换为 U+FFFD）
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
