mod exact;
mod proximity;
mod shape_keys;
