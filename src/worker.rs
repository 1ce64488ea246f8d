mod channel;
mod dispatcher;
mod manager;

pub(crate) use manager::ConnectionWorker;
