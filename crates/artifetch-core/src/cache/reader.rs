//! ArtifactReader - 解決済みバイト列の読み取り専用ビュー
//!
//! キャッシュ由来でも取得直後でも同じ型で返す。独自のバッファリングはしない。

use std::io::{self, BufRead, Cursor, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

#[derive(Debug, Clone)]
pub struct ArtifactReader {
    cursor: Cursor<Bytes>,
}

impl ArtifactReader {
    pub fn new(bytes: Bytes) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// 読み取り位置に関係なく成果物全体の長さ
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &Bytes {
        self.cursor.get_ref()
    }

    pub fn into_bytes(self) -> Bytes {
        self.cursor.into_inner()
    }
}

impl Read for ArtifactReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl BufRead for ArtifactReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.cursor.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.cursor.consume(amt)
    }
}

impl AsyncRead for ArtifactReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.cursor).poll_read(cx, buf)
    }
}
