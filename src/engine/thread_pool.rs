// Pool de threads de busca com submissão não bloqueante.
// Uma tarefa só é aceite se houver um worker parado à espera; caso contrário
// o chamador recebe `None` e executa o trabalho ele próprio.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Resultado futuro de uma tarefa submetida ao pool
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Espera pelo resultado. `None` se a tarefa entrou em pânico.
    pub fn join(self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Resultado se já estiver pronto, sem bloquear
    pub fn try_join(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

pub struct ThreadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    idle: Arc<AtomicUsize>,
}

impl ThreadPool {
    /// Cria `size` workers. `size == 0` gera um pool que rejeita tudo.
    pub fn new(size: usize) -> Result<Self> {
        // Canal de capacidade zero: o envio só acontece se um worker estiver em recv
        let (sender, receiver) = channel::bounded::<Job>(0);
        let idle = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let receiver = receiver.clone();
            let idle = Arc::clone(&idle);
            let handle = thread::Builder::new()
                .name(format!("virada-worker-{}", id))
                .spawn(move || worker_loop(receiver, idle))?;
            workers.push(handle);
        }

        log::debug!("thread pool criado com {} workers", size);

        Ok(ThreadPool {
            sender: Some(sender),
            workers,
            idle,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.load(Ordering::Relaxed)
    }

    /// Submete a tarefa se houver um worker livre. Nunca bloqueia.
    pub fn try_submit<F, T>(&self, task: F) -> Option<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.as_ref()?;
        if self.idle_count() == 0 {
            return None;
        }

        let (result_tx, result_rx) = channel::bounded(1);
        let job: Job = Box::new(move || {
            let _ = result_tx.send(task());
        });

        match sender.try_send(job) {
            Ok(()) => Some(TaskHandle { receiver: result_rx }),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => None,
        }
    }
}

fn worker_loop(receiver: Receiver<Job>, idle: Arc<AtomicUsize>) {
    loop {
        idle.fetch_add(1, Ordering::Relaxed);
        let job = receiver.recv();
        idle.fetch_sub(1, Ordering::Relaxed);
        match job {
            Ok(job) => job(),
            Err(_) => break,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Fecha o canal: os workers saem do recv
        self.sender.take();
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::error!("worker terminou em pânico");
            }
        }
    }
}
