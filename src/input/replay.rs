//! 观测回放: 从 JSON Lines 读取逐帧观测
//!
//! 每行一个JSON数组, 数组元素为形状; 空行跳过。

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::geometry::Shape;

pub struct FrameReader<R: BufRead> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl FrameReader<Box<dyn BufRead + Send>> {
    /// 打开文件, `-` 表示标准输入
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader: Box<dyn BufRead + Send> = if path == Path::new("-") {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(path)
                .with_context(|| format!("failed to open frame file {}", path.display()))?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<Vec<Shape>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let line_no = self.line_no;
                    return Some(
                        serde_json::from_str(line)
                            .with_context(|| format!("invalid frame on line {}", line_no)),
                    );
                }
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e)
                        .context(format!("failed to read line {}", self.line_no))))
                }
            }
        }
    }
}
