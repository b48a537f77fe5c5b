use {
    crate::{
        backends::vc4::{CreateBo, CreatedBo, MmapBo, MmapOffset, SetTiling, Vc4Device},
        utils::{
            mmap::{Mmapped, mmap},
            oserror::OsError,
        },
        video::{
            Modifier,
            gem::{GemDevice, GemHandle},
        },
    },
    ahash::AHashMap,
    std::cell::{Cell, RefCell},
    uapi::c,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FakeBo {
    pub size: u32,
    pub modifier: Option<Modifier>,
    pub imported: bool,
}

/// An in-memory VC4 device that tracks which GEM handles are alive.
#[derive(Default)]
pub struct FakeVc4 {
    next_handle: Cell<u32>,
    bos: RefCell<AHashMap<u32, FakeBo>>,
    imports: RefCell<AHashMap<(c::dev_t, c::ino_t), u32>>,
    pub fail_create: Cell<Option<c::c_int>>,
    pub fail_set_tiling: Cell<Option<c::c_int>>,
    pub fail_mmap_bo: Cell<Option<c::c_int>>,
    pub fail_prime_fd: Cell<Option<c::c_int>>,
    pub set_tiling_calls: Cell<usize>,
}

impl FakeVc4 {
    fn alloc(&self, bo: FakeBo) -> GemHandle {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        self.bos.borrow_mut().insert(handle, bo);
        GemHandle(handle)
    }

    pub fn live_handles(&self) -> Vec<u32> {
        let mut handles: Vec<_> = self.bos.borrow().keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn bo(&self, handle: GemHandle) -> Option<FakeBo> {
        self.bos.borrow().get(&handle.0).cloned()
    }
}

fn fake_offset(handle: GemHandle) -> u64 {
    (handle.0 as u64) << 12
}

impl GemDevice for FakeVc4 {
    fn gem_close(&self, handle: GemHandle) -> Result<(), OsError> {
        match self.bos.borrow_mut().remove(&handle.0) {
            Some(_) => {
                self.imports.borrow_mut().retain(|_, h| *h != handle.0);
                Ok(())
            }
            None => Err(OsError(c::ENOENT)),
        }
    }

    fn prime_fd_to_handle(&self, fd: c::c_int) -> Result<GemHandle, OsError> {
        if self.fail_prime_fd.get() == Some(fd) {
            return Err(OsError(c::EBADF));
        }
        let stat = uapi::fstat(fd)?;
        let key = (stat.st_dev, stat.st_ino);
        if let Some(&handle) = self.imports.borrow().get(&key) {
            return Ok(GemHandle(handle));
        }
        let handle = self.alloc(FakeBo {
            size: stat.st_size as u32,
            modifier: None,
            imported: true,
        });
        self.imports.borrow_mut().insert(key, handle.0);
        Ok(handle)
    }

    fn mmap(&self, len: usize, prot: c::c_int, offset: u64) -> Result<Mmapped, OsError> {
        let known = self
            .bos
            .borrow()
            .keys()
            .any(|&h| fake_offset(GemHandle(h)) == offset);
        if !known {
            return Err(OsError(c::EINVAL));
        }
        mmap(len, prot, c::MAP_PRIVATE | c::MAP_ANONYMOUS, -1, 0)
    }
}

impl Vc4Device for FakeVc4 {
    fn create_bo(&self, req: CreateBo) -> Result<CreatedBo, OsError> {
        if let Some(e) = self.fail_create.get() {
            return Err(OsError(e));
        }
        if req.size == 0 {
            return Err(OsError(c::EINVAL));
        }
        let handle = self.alloc(FakeBo {
            size: req.size,
            modifier: None,
            imported: false,
        });
        Ok(CreatedBo { handle })
    }

    fn set_tiling(&self, req: SetTiling) -> Result<(), OsError> {
        self.set_tiling_calls.set(self.set_tiling_calls.get() + 1);
        if let Some(e) = self.fail_set_tiling.get() {
            return Err(OsError(e));
        }
        match self.bos.borrow_mut().get_mut(&req.handle.0) {
            Some(bo) => {
                bo.modifier = Some(req.modifier);
                Ok(())
            }
            None => Err(OsError(c::ENOENT)),
        }
    }

    fn mmap_bo(&self, req: MmapBo) -> Result<MmapOffset, OsError> {
        if let Some(e) = self.fail_mmap_bo.get() {
            return Err(OsError(e));
        }
        if !self.bos.borrow().contains_key(&req.handle.0) {
            return Err(OsError(c::ENOENT));
        }
        Ok(MmapOffset {
            offset: fake_offset(req.handle),
        })
    }
}
