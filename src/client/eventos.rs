//! Client side of the realtime channel (`GET /api/eventos`)
//!
//! The server sends `text/event-stream` frames: `event:` and `data:` lines
//! terminated by a blank line. Each frame's data is one JSON `EventoPortal`.

use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Method;
use std::collections::VecDeque;
use tracing::{debug, warn};

use super::error::{ClientError, ClientResult};
use super::http::PortalClient;
use crate::domain::EventoPortal;

/// One dispatched SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSse {
    pub evento: Option<String>,
    pub data: String,
}

/// Incremental SSE parser. Chunks may split lines (or UTF-8 sequences)
/// anywhere; only complete lines are decoded.
#[derive(Debug, Default)]
pub struct ParserSse {
    buffer: Vec<u8>,
    evento: Option<String>,
    data: Vec<String>,
}

impl ParserSse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the frames it completed.
    pub fn alimentar(&mut self, chunk: &[u8]) -> Vec<FrameSse> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(fin) = self.buffer.iter().position(|b| *b == b'\n') {
            let bruta: Vec<u8> = self.buffer.drain(..=fin).collect();
            let texto = String::from_utf8_lossy(&bruta[..fin]);
            let linea = texto.strip_suffix('\r').unwrap_or(&texto);

            if linea.is_empty() {
                if let Some(frame) = self.despachar() {
                    frames.push(frame);
                }
                continue;
            }
            self.procesar_linea(linea);
        }
        frames
    }

    fn procesar_linea(&mut self, linea: &str) {
        // Comments (keep-alives) start with ':'
        if linea.starts_with(':') {
            return;
        }

        let (campo, valor) = match linea.split_once(':') {
            Some((campo, valor)) => (campo, valor.strip_prefix(' ').unwrap_or(valor)),
            None => (linea, ""),
        };

        match campo {
            "event" => self.evento = Some(valor.to_string()),
            "data" => self.data.push(valor.to_string()),
            _ => {}
        }
    }

    fn despachar(&mut self) -> Option<FrameSse> {
        let evento = self.evento.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(FrameSse { evento, data })
    }
}

/// Yields the portal events received over an open SSE connection.
pub struct EventListener {
    stream: BoxStream<'static, ClientResult<Vec<u8>>>,
    parser: ParserSse,
    pendientes: VecDeque<EventoPortal>,
}

impl EventListener {
    /// Open `GET /api/eventos` (admin only).
    pub async fn conectar(client: &PortalClient) -> ClientResult<Self> {
        let req = client
            .request_stream(Method::GET, "/api/eventos")?
            .header(ACCEPT, "text/event-stream");
        let response = client
            .ejecutar(req, "Error al conectar con el canal de eventos")
            .await?;

        debug!("Portal event stream connected");
        Ok(Self::desde_stream(response.bytes_stream()))
    }

    /// Listen on any byte stream carrying SSE frames.
    pub fn desde_stream<S, B>(stream: S) -> Self
    where
        S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
        B: AsRef<[u8]>,
    {
        let stream = stream
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.as_ref().to_vec())
                    .map_err(|source| ClientError::Network {
                        contexto: "Canal de eventos interrumpido".to_string(),
                        source,
                    })
            })
            .boxed();

        Self {
            stream,
            parser: ParserSse::new(),
            pendientes: VecDeque::new(),
        }
    }

    /// Next event, `None` once the server closes the stream. Frames whose
    /// data is not a portal event are skipped.
    pub async fn siguiente(&mut self) -> Option<ClientResult<EventoPortal>> {
        loop {
            if let Some(evento) = self.pendientes.pop_front() {
                return Some(Ok(evento));
            }

            let chunk = match self.stream.next().await? {
                Ok(chunk) => chunk,
                Err(e) => return Some(Err(e)),
            };

            for frame in self.parser.alimentar(&chunk) {
                match serde_json::from_str::<EventoPortal>(&frame.data) {
                    Ok(evento) => self.pendientes.push_back(evento),
                    Err(e) => {
                        warn!(error = %e, evento = ?frame.evento, "Ignoring malformed portal event")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::eventos::{EVENTO_ESTATUS_REVISION, EVENTO_PROVEEDOR_ACTUALIZADO};
    use futures::stream;

    #[test]
    fn parses_event_and_data_lines() {
        let mut parser = ParserSse::new();
        let frames = parser.alimentar(b"event: estatus-revision\ndata: {\"a\":1}\n\n");
        assert_eq!(
            frames,
            vec![FrameSse {
                evento: Some("estatus-revision".to_string()),
                data: "{\"a\":1}".to_string(),
            }]
        );
    }

    #[test]
    fn frames_split_across_chunks() {
        let mut parser = ParserSse::new();
        assert!(parser.alimentar(b"event: x\r\nda").is_empty());
        assert!(parser.alimentar(b"ta: uno\r\n").is_empty());
        let frames = parser.alimentar(b"data: dos\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "uno\ndos");
    }

    #[test]
    fn keep_alive_comments_dispatch_nothing() {
        let mut parser = ParserSse::new();
        assert!(parser.alimentar(b":\n\n: ping\n\n").is_empty());
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        let texto = "data: revisión\n\n".as_bytes();
        let corte = texto.iter().position(|b| *b >= 0x80).unwrap() + 1;

        let mut parser = ParserSse::new();
        assert!(parser.alimentar(&texto[..corte]).is_empty());
        let frames = parser.alimentar(&texto[corte..]);
        assert_eq!(frames[0].data, "revisión");
    }

    fn frame(evento: &EventoPortal) -> Vec<u8> {
        format!(
            "event: {}\ndata: {}\n\n",
            evento.evento,
            serde_json::to_string(evento).unwrap()
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn listener_yields_events_and_skips_garbage() {
        let primero = EventoPortal::admin_proveedores(EVENTO_ESTATUS_REVISION, 1, "APROBADO");
        let segundo = EventoPortal::admin_proveedores(EVENTO_PROVEEDOR_ACTUALIZADO, 2, "actualizado");

        let mut bytes = frame(&primero);
        bytes.extend_from_slice(b"event: basura\ndata: no es json\n\n");
        let (a, b) = bytes.split_at(10);
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> =
            vec![Ok(a.to_vec()), Ok(b.to_vec()), Ok(frame(&segundo))];

        let mut listener = EventListener::desde_stream(stream::iter(chunks));
        assert_eq!(listener.siguiente().await.unwrap().unwrap(), primero);
        assert_eq!(listener.siguiente().await.unwrap().unwrap(), segundo);
        assert!(listener.siguiente().await.is_none());
    }
}
