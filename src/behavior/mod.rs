/*
 * User behavior tracking. Writes go through a worker
 * thread so a slow insert never holds a request up,
 * the handlers fire events at it and move on.
 */

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use color_eyre::Result;
use eyre::eyre;
use log::{debug, error, info};
use crate::db::{self, Pool};

#[derive(Debug)]
pub struct SearchEvent {
  // None when the search came from an anonymous visitor.
  pub user_id: Option<i64>,
  pub keywords: String,
  pub results: usize
}

#[derive(Debug)]
pub struct ClickEvent {
  pub user_id: i64,
  pub article_id: i64
}

#[derive(Debug)]
enum BehaviorMessage {
  Close,
  Search(SearchEvent),
  Click(ClickEvent)
}

pub struct BehaviorService {
  tx: SyncSender<BehaviorMessage>,
  thread_handle: Option<JoinHandle<()>>
}

impl BehaviorService {

  pub fn open(pool: &Pool, queue_size: usize) -> Result<BehaviorService> {
    // Producers never block on the buffer, see try_send
    // below. They will still error if the receiving end
    // is disconnected, which is good.
    let (tx, rx) = mpsc::sync_channel::<BehaviorMessage>(queue_size);
    // The thread keeps this connection until it closes.
    let connection = pool.clone().get()?;
    info!("Starting behavior tracking thread...");
    let thread_handle = thread::spawn(move || loop {
      match rx.recv() {
        Ok(BehaviorMessage::Close) => {
          info!("Behavior tracking thread terminating...");
          break;
        },
        Ok(BehaviorMessage::Search(event)) => {
          debug!("Inserting search event: {:?}", event);
          if let Err(e) = db::insert_search_event(
            &connection,
            event.user_id,
            &event.keywords,
            event.results as i64
          ) {
            error!("Could not insert a search event - {}", e);
          }
        },
        Ok(BehaviorMessage::Click(event)) => {
          debug!("Inserting click event: {:?}", event);
          if let Err(e) = db::insert_click_event(
            &connection,
            event.user_id,
            event.article_id
          ) {
            error!("Could not insert a click event - {}", e);
          }
        },
        // Stop the thread in case of error:
        Err(_) => break
      }
    });
    Ok(BehaviorService {
      tx,
      thread_handle: Some(thread_handle)
    })
  }

  pub fn record_search(&self, event: SearchEvent) -> Result<()> {
    self.send(BehaviorMessage::Search(event))
  }

  pub fn record_click(&self, event: ClickEvent) -> Result<()> {
    self.send(BehaviorMessage::Click(event))
  }

  // A full buffer drops the event, only a dead thread
  // surfaces as an error.
  fn send(&self, message: BehaviorMessage) -> Result<()> {
    match self.tx.try_send(message) {
      Ok(_) => Ok(()),
      Err(TrySendError::Full(msg)) => {
        error!("Behavior queue is full, dropping event: {:?}", msg);
        Ok(())
      },
      Err(TrySendError::Disconnected(msg)) => {
        error!("Behavior thread is dead, could not record: {:?}", msg);
        Err(eyre!("Behavior thread appears to have died"))
      }
    }
  }

}

// Drop is a good place to ask for termination of the
// thread. The Option dance around the JoinHandle is
// required to be able to join from a &mut self.
impl Drop for BehaviorService {
  fn drop(&mut self) {
    match self.tx.send(BehaviorMessage::Close) {
      Ok(_) => info!("BehaviorService is closing..."),
      Err(e) => error!("Could not close BehaviorService - {}", e)
    }
    self.thread_handle.take().map(JoinHandle::join);
  }
}
