use std::any::Any;

type Value = Box<dyn Any + Send + Sync>;

/// How a field is recorded when a new frame is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    Independent,
    /// Also overwrites the value of the previous frame.
    MergeIntoPrevious,
}

/// One field of the model `M` to back up.
pub struct Field<M> {
    pub name: &'static str,
    pub merge: MergePolicy,
    capture: Box<dyn Fn(&M) -> Value + Send + Sync>,
    restore: Box<dyn Fn(&mut M, &Value) + Send + Sync>,
}

impl<M: 'static> Field<M> {
    pub fn new<T>(
        name: &'static str,
        merge: MergePolicy,
        get: fn(&M) -> &T,
        set: fn(&mut M, T),
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            name,
            merge,
            capture: Box::new(move |model: &M| -> Value { Box::new(get(model).clone()) }),
            restore: Box::new(move |model: &mut M, value: &Value| {
                if let Some(value) = value.downcast_ref::<T>() {
                    set(model, value.clone());
                }
            }),
        }
    }
}

pub struct History<M> {
    fields: Vec<Field<M>>,
    frames: Vec<Vec<Value>>,
    /// Index of the frame matching the model; `None` while empty.
    index: Option<usize>,
    max_frames: usize,
    on_load: Option<Box<dyn Fn(&mut M) + Send + Sync>>,
}

impl<M> History<M> {
    pub fn new(fields: Vec<Field<M>>, max_frames: usize) -> Self {
        Self {
            fields,
            frames: Vec::new(),
            index: None,
            max_frames: max_frames.max(1),
            on_load: None,
        }
    }

    /// Called with the model after every successful undo or redo.
    pub fn with_on_load(mut self, on_load: impl Fn(&mut M) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Box::new(on_load));
        self
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.index = None;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(0, |i| i + 1) < self.frames.len()
    }

    pub fn make_backup(&mut self, model: &M) {
        let next = self.index.map_or(0, |i| i + 1);
        self.frames.truncate(next);

        let frame: Vec<Value> = self.fields.iter().map(|field| (field.capture)(model)).collect();
        if let Some(prior) = self.frames.last_mut() {
            for (slot, field) in prior.iter_mut().zip(&self.fields) {
                if field.merge == MergePolicy::MergeIntoPrevious {
                    *slot = (field.capture)(model);
                }
            }
        }
        self.frames.push(frame);

        let excess = self.frames.len().saturating_sub(self.max_frames);
        if excess > 0 {
            self.frames.drain(..excess);
        }
        self.index = Some(self.frames.len() - 1);
    }

    pub fn undo(&mut self, model: &mut M) -> bool {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                self.load(model, i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn redo(&mut self, model: &mut M) -> bool {
        if !self.can_redo() {
            return false;
        }
        let i = self.index.map_or(0, |i| i + 1);
        self.index = Some(i);
        self.load(model, i);
        true
    }

    fn load(&self, model: &mut M, i: usize) {
        for (value, field) in self.frames[i].iter().zip(&self.fields) {
            (field.restore)(model, value);
        }
        if let Some(on_load) = &self.on_load {
            on_load(model);
        }
    }
}
