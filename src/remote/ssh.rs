use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

use ssh2::{File, Session, Sftp};

use super::{RemoteConnector, RemoteEntry, RemoteSession, RemoteTarget};
use crate::error::{ResourceAccessError, Result};
use crate::item::ResourceStream;

/// Connects with libssh2. Host keys are not verified.
#[derive(Debug, Default)]
pub struct Ssh2Connector;

impl RemoteConnector for Ssh2Connector {
    fn connect(&self, target: &RemoteTarget) -> Result<Box<dyn RemoteSession>> {
        let fail = |reason: String| ResourceAccessError::Remote {
            host: target.host.clone(),
            reason,
        };

        let addr = (target.host.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| fail(e.to_string()))?
            .next()
            .ok_or_else(|| fail("host name did not resolve".to_string()))?;
        let tcp = TcpStream::connect_timeout(&addr, target.timeout).map_err(|e| fail(e.to_string()))?;

        let mut session = Session::new().map_err(|e| fail(e.to_string()))?;
        session.set_timeout(target.timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| fail(e.to_string()))?;

        let username = target
            .username
            .as_deref()
            .ok_or_else(|| fail("no user name in URI".to_string()))?;
        let auth = match &target.password {
            Some(password) => session.userauth_password(username, password),
            None => session.userauth_agent(username),
        };
        auth.map_err(|e| fail(format!("authentication failed: {}", e)))?;

        let sftp = session.sftp().map_err(|e| fail(e.to_string()))?;
        tracing::debug!(host = %target.host, port = target.port, user = username, "SFTP session established");

        Ok(Box::new(Ssh2Session {
            host: target.host.clone(),
            session,
            sftp,
        }))
    }
}

struct Ssh2Session {
    host: String,
    session: Session,
    sftp: Sftp,
}

impl Ssh2Session {
    fn error(&self, path: &str, e: ssh2::Error) -> ResourceAccessError {
        ResourceAccessError::Remote {
            host: self.host.clone(),
            reason: format!("{}: {}", path, e),
        }
    }
}

impl RemoteSession for Ssh2Session {
    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let listing = self
            .sftp
            .readdir(Path::new(dir))
            .map_err(|e| self.error(dir, e))?;

        Ok(listing
            .into_iter()
            .filter_map(|(path, stat)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(RemoteEntry {
                    name,
                    is_dir: stat.is_dir(),
                })
            })
            .collect())
    }

    fn open(&mut self, path: &str) -> Result<ResourceStream> {
        let file = self
            .sftp
            .open(Path::new(path))
            .map_err(|e| self.error(path, e))?;
        Ok(Box::new(SftpStream {
            file,
            _session: self.session.clone(),
        }))
    }
}

/// Keeps the session alive for as long as the file is being read.
struct SftpStream {
    file: File,
    _session: Session,
}

impl Read for SftpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
