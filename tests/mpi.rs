//! Runs as a singleton MPI job (no `mpirun` needed). MPI may only be
//! initialized once per process, so everything lives in one test.
#![cfg(feature = "mpi")]

use scatter_life::LifeError;
use scatter_life::scatterlife::mpi::{MpiComm, run_world};
use scatter_life::scatterlife::{Communicator, ScatterLifeConfig};

#[test]
fn singleton_world() {
    let universe = mpi::initialize().expect("MPI initializes once");
    let comm = MpiComm::new(universe.world());
    assert_eq!(comm.rank(), 0);
    assert_eq!(comm.size(), 1);

    // With one rank every collective degenerates to a local copy.
    let mut buf = vec![1u8, 2, 3];
    comm.broadcast(&mut buf, 0).unwrap();
    assert_eq!(buf, vec![1, 2, 3]);

    let mut chunk = vec![0u8; 4];
    comm.reduce_scatter_sum(&[4, 3, 2, 1], &mut chunk).unwrap();
    assert_eq!(chunk, vec![4, 3, 2, 1]);

    let mut dest = vec![0u8; 2];
    comm.gather(&[9, 8], Some(&mut dest), 0).unwrap();
    assert_eq!(dest, vec![9, 8]);

    // Length checks fail locally before any MPI call.
    let err = comm.reduce_scatter_sum(&[1, 2], &mut [0u8; 1]).unwrap_err();
    assert!(matches!(err, LifeError::BufferLength { expected: 2, actual: 1 }));

    // The world must have exactly one rank per direction.
    let config = ScatterLifeConfig::default().dimensions(16, 16);
    let err = run_world(&comm, &config, 3, None).unwrap_err();
    assert!(matches!(err, LifeError::WorkerCount { expected: 8, actual: 1 }));
}
