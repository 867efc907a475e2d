//! ZIP archives served over HTTP Range requests.

mod common;

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{Fixture, content};
use resfind::{PathItemExt, Recursion, Registry};

/// Serves one file, honouring `Range: bytes=a-b`. One request per connection.
struct RangeServer {
    url: String,
    requests: Arc<AtomicUsize>,
}

impl RangeServer {
    fn start(data: Vec<u8>, name: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/{}", listener.local_addr().unwrap(), name);
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let data = Arc::new(data);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                counter.fetch_add(1, Ordering::SeqCst);
                let data = Arc::clone(&data);
                thread::spawn(move || serve(stream, &data));
            }
        });

        Self { url, requests }
    }
}

fn serve(mut stream: TcpStream, data: &[u8]) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut range = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        if let Some((key, value)) = line.split_once(':')
            && key.eq_ignore_ascii_case("range")
        {
            let spec = value.trim().trim_start_matches("bytes=");
            let (start, end) = spec.split_once('-').unwrap();
            range = Some((start.parse::<usize>().unwrap(), end.parse::<usize>().unwrap()));
        }
    }

    let response = if request_line.starts_with("HEAD") {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            data.len()
        )
        .into_bytes()
    } else {
        let (start, end) = range.unwrap_or((0, data.len() - 1));
        let end = end.min(data.len() - 1);
        let body = &data[start..=end];
        let mut response = format!(
            "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nConnection: close\r\n\r\n",
            body.len(),
            start,
            end,
            data.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    };

    let _ = stream.write_all(&response);
}

#[test]
fn remote_jar_is_searched_like_a_local_one() {
    let fixture = Fixture::new();
    let server = RangeServer::start(std::fs::read(&fixture.jar).unwrap(), "fixture.jar");
    let registry = Registry::default();

    let item = registry.resolve(&format!("jar:{}!/", server.url)).unwrap();
    assert_eq!(item.uri().unwrap().as_str(), format!("jar:{}!/", server.url));

    assert_eq!(
        item.find_resources_for_extension("file", Recursion::Recursive)
            .unwrap()
            .len(),
        7
    );

    let resource = item
        .find_resource("a/a/test2.file", Recursion::NonRecursive)
        .unwrap()
        .unwrap();
    assert_eq!(resource.read_to_vec().unwrap(), content("a/a/test2.file"));

    // The listing is not fetched again for the second search.
    let before = server.requests.load(Ordering::SeqCst);
    item.find_resources("test1.file", Recursion::Recursive).unwrap();
    assert_eq!(server.requests.load(Ordering::SeqCst), before);
}

#[test]
fn plain_url_with_jar_suffix_is_claimed() {
    let fixture = Fixture::new();
    let server = RangeServer::start(std::fs::read(&fixture.zip).unwrap(), "fixture.zip");
    let registry = Registry::default();

    let item = registry.resolve(&server.url).unwrap();
    assert_eq!(item.uri().unwrap().scheme(), "jar");
    assert!(item.find_resource("test1.file", Recursion::NonRecursive).unwrap().is_some());
}
